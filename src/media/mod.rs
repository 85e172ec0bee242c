mod metadata;
mod storage;

pub use metadata::{metadata_or_unknown, read_image_metadata, ImageMetadata};
pub use storage::{
    clean_name, validate_uploads, ImageStorage, MediaSource, StorageDir, UploadLimits,
    UploadRejection, UploadedFile, ALLOWED_MIME_TYPES, PUBLIC_IMAGES_PREFIX,
};
