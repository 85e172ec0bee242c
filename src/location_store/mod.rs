mod models;
mod schema;
mod sqlite_location_store;

pub use models::*;
pub use schema::LOCATION_VERSIONED_SCHEMAS;
pub use sqlite_location_store::{is_unique_violation, SqliteLocationStore};

use crate::taxonomy::{LocationKey, LocationTaxonomy};
use anyhow::Result;

pub trait LocationStore: Send + Sync {
    /// Upserts by (name, address) and returns the id of the new or existing row.
    fn save(&self, entry: &LocationEntry) -> Result<i64>;
    /// Applies the present fields of `patch` to a `maps` row. Returns false when the
    /// patch is empty or no `maps` row has this id.
    fn update_by_id(&self, id: i64, patch: &LocationPatch) -> Result<bool>;

    fn get_all(&self) -> Result<Vec<Location>>;
    fn get_by_id(&self, id: i64) -> Result<Option<Location>>;
    fn get_by_parent_id(&self, parent_id: i64) -> Result<Vec<Location>>;
    fn get_by_category(&self, category: LocationCategory) -> Result<Vec<Location>>;

    /// Rows without a parent, optionally restricted to one category.
    fn get_top_level(&self, category: Option<LocationCategory>) -> Result<Vec<Location>>;
    /// Children of type `location_type` of any of `parent_ids`, in one query.
    fn get_children_of(
        &self,
        parent_ids: &[i64],
        location_type: LocationType,
    ) -> Result<Vec<Location>>;
    fn count_by_type(&self) -> Result<Vec<(LocationType, usize)>>;

    /// Deletes every location and returns how many rows were removed.
    fn clear(&self) -> Result<usize>;
}

pub trait TaxonomyStore: Send + Sync {
    /// Every entry, ordered by key.
    fn get_all_taxonomy(&self) -> Result<Vec<LocationTaxonomy>>;
    fn get_taxonomy_by_key(&self, key: &LocationKey) -> Result<Option<LocationTaxonomy>>;
    /// Case-insensitive substring match on the encoded key, ordered by key.
    fn search_taxonomy(&self, query: &str) -> Result<Vec<LocationTaxonomy>>;
    /// Swaps the whole table for `entries` in one transaction.
    fn replace_taxonomy(&self, entries: &[LocationTaxonomy]) -> Result<usize>;
    fn count_taxonomy(&self) -> Result<usize>;
    fn clear_taxonomy(&self) -> Result<usize>;
}
