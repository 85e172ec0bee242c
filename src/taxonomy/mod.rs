pub mod data;
mod key;
mod resolver;

pub use key::{is_in_scope, is_valid_location_key, LocationKey, LocationKeyError, KEY_DELIMITER};
pub use resolver::{
    cities_of, countries, format_for_display, format_location_name, generate_combinations,
    neighborhoods_of, search, slugify_segment, LocationTaxonomy,
};
