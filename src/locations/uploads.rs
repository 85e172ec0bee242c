//! Direct photo uploads attached to an existing location.

use super::factory::create_from_upload;
use super::{now_ms, refresh_location_metrics};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::location_store::{
    ImageSet, ImageVariant, Location, LocationStatus, LocationStore, LocationType,
};
use crate::media::{
    metadata_or_unknown, validate_uploads, ImageStorage, MediaSource, UploadLimits, UploadedFile,
};
use crate::server::metrics::record_images_stored;
use std::sync::Arc;
use tracing::info;

/// A parsed upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub location_id: Option<i64>,
    pub photographer_credit: Option<String>,
    pub files: Vec<UploadedFile>,
}

pub struct UploadsService {
    store: Arc<dyn LocationStore>,
    storage: ImageStorage,
    limits: UploadLimits,
}

impl UploadsService {
    pub fn new(store: Arc<dyn LocationStore>, storage: ImageStorage, limits: UploadLimits) -> Self {
        Self {
            store,
            storage,
            limits,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub async fn add(&self, request: UploadRequest) -> ApiResult<Location> {
        let Some(location_id) = request.location_id.filter(|id| *id > 0) else {
            return Err(ApiError::validation(vec![FieldError::new(
                "locationId",
                "Location ID is required",
            )]));
        };
        validate_uploads(&request.files, &self.limits)
            .map_err(|rejection| ApiError::BadRequest(rejection.to_string()))?;

        let parent = self
            .store
            .get_by_id(location_id)?
            .filter(|l| l.entry.location_type == LocationType::Maps)
            .ok_or_else(|| ApiError::not_found("Parent location", location_id))?;

        let timestamp_ms = now_ms();
        let mut entry = create_from_upload(&parent, timestamp_ms);
        let id = self.store.save(&entry)?;

        let dir = self
            .storage
            .storage_dir(&parent.entry.name, MediaSource::Uploads, timestamp_ms);
        let mut images = Vec::with_capacity(request.files.len());
        let mut variants = Vec::with_capacity(request.files.len());
        for (index, file) in request.files.iter().enumerate() {
            let (fs_path, public_path) = self.storage.save_upload(&dir, index, file).await?;
            let metadata = metadata_or_unknown(fs_path).await;
            variants.push(ImageVariant {
                kind: file.variant,
                path: public_path.clone(),
                width: metadata.width,
                height: metadata.height,
                size: metadata.size,
                format: metadata.format,
            });
            images.push(public_path);
        }
        record_images_stored(MediaSource::Uploads.dir_name(), images.len());

        let photographer_credit = request
            .photographer_credit
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        entry.image_set = Some(ImageSet::new(
            variants,
            photographer_credit,
            chrono::Utc::now().to_rfc3339(),
        ));
        entry.images = images;
        entry.status = LocationStatus::Complete;
        self.store.save(&entry)?;
        info!(
            "Stored {} uploaded files as location {} under {}",
            entry.images.len(),
            id,
            parent.id
        );
        refresh_location_metrics(self.store.as_ref());

        self.store
            .get_by_id(id)?
            .ok_or_else(|| ApiError::Internal(format!("Location {} vanished after save", id)))
    }
}
