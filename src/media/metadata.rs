use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub size: u64,
    pub format: String,
}

impl ImageMetadata {
    pub fn unknown() -> Self {
        Self {
            width: 0,
            height: 0,
            size: 0,
            format: "unknown".to_string(),
        }
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Reads dimensions and format from the image header without decoding pixels.
pub fn read_image_metadata(path: &Path) -> Result<ImageMetadata> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("File not found: {:?}", path))?
        .len();
    let reader = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to sniff format of {:?}", path))?;
    let format = reader
        .format()
        .map(format_name)
        .with_context(|| format!("Unrecognized image format: {:?}", path))?;
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Invalid or corrupted image file: {:?}", path))?;

    Ok(ImageMetadata {
        width,
        height,
        size,
        format,
    })
}

/// Like [`read_image_metadata`], but runs on the blocking pool, logs failures and
/// falls back to zeroed metadata.
pub async fn metadata_or_unknown(path: PathBuf) -> ImageMetadata {
    match tokio::task::spawn_blocking(move || read_image_metadata(&path)).await {
        Ok(Ok(metadata)) => metadata,
        Ok(Err(err)) => {
            warn!("Failed to extract image metadata: {:#}", err);
            ImageMetadata::unknown()
        }
        Err(err) => {
            warn!("Image metadata task failed: {}", err);
            ImageMetadata::unknown()
        }
    }
}
