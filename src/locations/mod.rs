//! Location workflows: creation flows, editing and composed reads.

mod factory;
mod instagram;
mod maps;
mod query;
mod taxonomy;
mod uploads;

pub use factory::{
    create_from_instagram, create_from_maps, create_from_upload, maps_url, MapsEnrichment,
    INSTAGRAM_ADDRESS, UPLOAD_ADDRESS,
};
pub use instagram::{AddInstagramRequest, InstagramService};
pub use maps::{AddMapsRequest, MapsService, UpdateMapsRequest};
pub use query::{get_location_by_id, list_locations, LocationWithChildren};
pub use taxonomy::{seed_taxonomy, seed_taxonomy_if_empty, TaxonomyService};
pub use uploads::{UploadRequest, UploadsService};

use crate::location_store::LocationStore;
use crate::server::metrics::set_location_counts;
use tracing::warn;

/// Milliseconds since the epoch, used to name children and their image directories.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Pushes the current row counts into the location gauge.
pub(crate) fn refresh_location_metrics(store: &dyn LocationStore) {
    match store.count_by_type() {
        Ok(counts) => set_location_counts(&counts),
        Err(err) => warn!("Failed to count locations: {:#}", err),
    }
}
