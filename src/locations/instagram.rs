//! Ingestion of Instagram embeds as children of an existing location.

use super::factory::create_from_instagram;
use super::{now_ms, refresh_location_metrics};
use crate::enrichment::{ImageDownloader, InstagramMediaFetcher};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::location_store::{
    Location, LocationEntry, LocationStatus, LocationStore, LocationType,
};
use crate::media::{ImageStorage, MediaSource};
use crate::server::metrics::{record_enrichment_failure, record_images_stored};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInstagramRequest {
    pub embed_code: Option<String>,
    #[serde(alias = "parentId")]
    pub location_id: Option<i64>,
}

pub struct InstagramService {
    store: Arc<dyn LocationStore>,
    storage: ImageStorage,
    /// `None` when no RapidAPI key is configured.
    fetcher: Option<Arc<dyn InstagramMediaFetcher>>,
    downloader: Arc<dyn ImageDownloader>,
}

impl InstagramService {
    pub fn new(
        store: Arc<dyn LocationStore>,
        storage: ImageStorage,
        fetcher: Option<Arc<dyn InstagramMediaFetcher>>,
        downloader: Arc<dyn ImageDownloader>,
    ) -> Self {
        Self {
            store,
            storage,
            fetcher,
            downloader,
        }
    }

    /// Saves the embed as a draft child, then attaches whatever media can be fetched.
    /// Steps after the first save are never rolled back.
    pub async fn add(&self, request: AddInstagramRequest) -> ApiResult<Location> {
        let mut errors = Vec::new();
        let embed_code = request
            .embed_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if embed_code.is_none() {
            errors.push(FieldError::new("embedCode", "Embed code is required"));
        }
        let location_id = request.location_id.filter(|id| *id > 0);
        if location_id.is_none() {
            errors.push(FieldError::new("locationId", "Location ID is required"));
        }
        let (Some(embed_code), Some(location_id)) = (embed_code, location_id) else {
            return Err(ApiError::validation(errors));
        };

        let parent = self
            .store
            .get_by_id(location_id)?
            .filter(|l| l.entry.location_type == LocationType::Maps)
            .ok_or_else(|| ApiError::not_found("Parent location", location_id))?;

        let timestamp_ms = now_ms();
        let Some(mut entry) = create_from_instagram(embed_code, &parent, timestamp_ms) else {
            return Err(ApiError::validation(vec![FieldError::new(
                "embedCode",
                "Invalid embed code",
            )]));
        };
        let id = self.store.save(&entry)?;
        info!("Saved Instagram draft {} under location {}", id, parent.id);

        match &self.fetcher {
            None => warn!("RAPIDAPI_KEY not configured, skipping media fetch for {}", id),
            Some(fetcher) => {
                self.attach_media(fetcher.as_ref(), &parent, timestamp_ms, &mut entry)
                    .await;
                entry.status = LocationStatus::Complete;
                self.store.save(&entry)?;
            }
        }
        refresh_location_metrics(self.store.as_ref());

        self.store
            .get_by_id(id)?
            .ok_or_else(|| ApiError::Internal(format!("Location {} vanished after save", id)))
    }

    async fn attach_media(
        &self,
        fetcher: &dyn InstagramMediaFetcher,
        parent: &Location,
        timestamp_ms: i64,
        entry: &mut LocationEntry,
    ) {
        let urls = match fetcher.fetch_media_urls(&entry.url).await {
            Ok(urls) => urls,
            Err(err) => {
                warn!("Failed to fetch Instagram media for {}: {:#}", entry.url, err);
                record_enrichment_failure("instagram_media");
                return;
            }
        };
        debug!("Found {} media items for {}", urls.len(), entry.url);

        let dir = self
            .storage
            .storage_dir(&parent.entry.name, MediaSource::Instagram, timestamp_ms);
        let mut images = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let (fs_path, public_path) = dir.file(&format!("image_{}.jpg", index));
            match self.downloader.download(url, &fs_path).await {
                Ok(bytes) => {
                    debug!("Downloaded {} ({} bytes)", public_path, bytes);
                    images.push(public_path);
                }
                Err(err) => {
                    warn!("Failed to download image {} of {}: {:#}", index, entry.url, err);
                    record_enrichment_failure("image_download");
                }
            }
        }
        record_images_stored(MediaSource::Instagram.dir_name(), images.len());

        entry.images = images;
        entry.original_image_urls = urls;
    }
}
