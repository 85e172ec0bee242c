use axum::extract::FromRef;

use crate::enrichment::{ImageDownloader, InstagramMediaFetcher};
use crate::folder_opener::FolderOpener;
use crate::location_store::{LocationStore, TaxonomyStore};
use crate::locations::{
    InstagramService, MapsEnrichment, MapsService, TaxonomyService, UploadsService,
};
use crate::media::{ImageStorage, UploadLimits};
use std::sync::Arc;
use std::time::Instant;

use super::{RequestsLoggingLevel, ServerConfig};

pub type GuardedLocationStore = Arc<dyn LocationStore>;
pub type GuardedMapsService = Arc<MapsService>;
pub type GuardedInstagramService = Arc<InstagramService>;
pub type GuardedUploadsService = Arc<UploadsService>;
pub type OptionalFolderOpener = Option<Arc<dyn FolderOpener>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub location_store: GuardedLocationStore,
    pub maps_service: GuardedMapsService,
    pub instagram_service: GuardedInstagramService,
    pub uploads_service: GuardedUploadsService,
    pub taxonomy_service: TaxonomyService,
    pub folder_opener: OptionalFolderOpener,
}

/// Everything the services need besides the store.
pub struct ServerDependencies {
    pub storage: ImageStorage,
    pub maps_enrichment: MapsEnrichment,
    pub instagram_fetcher: Option<Arc<dyn InstagramMediaFetcher>>,
    pub image_downloader: Arc<dyn ImageDownloader>,
    pub upload_limits: UploadLimits,
    pub folder_opener: OptionalFolderOpener,
}

impl ServerState {
    pub fn new<S>(config: ServerConfig, hash: String, store: Arc<S>, deps: ServerDependencies) -> Self
    where
        S: LocationStore + TaxonomyStore + 'static,
    {
        let location_store: GuardedLocationStore = store.clone();
        let taxonomy_store: Arc<dyn TaxonomyStore> = store;
        ServerState {
            config,
            start_time: Instant::now(),
            hash,
            maps_service: Arc::new(MapsService::new(
                location_store.clone(),
                deps.maps_enrichment,
            )),
            instagram_service: Arc::new(InstagramService::new(
                location_store.clone(),
                deps.storage.clone(),
                deps.instagram_fetcher,
                deps.image_downloader,
            )),
            uploads_service: Arc::new(UploadsService::new(
                location_store.clone(),
                deps.storage,
                deps.upload_limits,
            )),
            taxonomy_service: TaxonomyService::new(taxonomy_store),
            folder_opener: deps.folder_opener,
            location_store,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for RequestsLoggingLevel {
    fn from_ref(input: &ServerState) -> Self {
        input.config.requests_logging_level.clone()
    }
}

impl FromRef<ServerState> for GuardedLocationStore {
    fn from_ref(input: &ServerState) -> Self {
        input.location_store.clone()
    }
}

impl FromRef<ServerState> for GuardedMapsService {
    fn from_ref(input: &ServerState) -> Self {
        input.maps_service.clone()
    }
}

impl FromRef<ServerState> for GuardedInstagramService {
    fn from_ref(input: &ServerState) -> Self {
        input.instagram_service.clone()
    }
}

impl FromRef<ServerState> for GuardedUploadsService {
    fn from_ref(input: &ServerState) -> Self {
        input.uploads_service.clone()
    }
}

impl FromRef<ServerState> for TaxonomyService {
    fn from_ref(input: &ServerState) -> Self {
        input.taxonomy_service.clone()
    }
}

impl FromRef<ServerState> for OptionalFolderOpener {
    fn from_ref(input: &ServerState) -> Self {
        input.folder_opener.clone()
    }
}
