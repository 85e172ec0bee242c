//! On-disk layout of location images.
//!
//! Files live under `{images_dir}/{clean_name}/{source}/{unix_ms}/`. Locations record
//! them as public paths (`src/data/images/...`) that the static file route serves.

use crate::location_store::VariantKind;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// URL path (without leading slash) under which `images_dir` is served.
pub const PUBLIC_IMAGES_PREFIX: &str = "src/data/images";

const CLEAN_NAME_MAX_CHARS: usize = 30;

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    Instagram,
    Uploads,
}

impl MediaSource {
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaSource::Instagram => "instagram",
            MediaSource::Uploads => "uploads",
        }
    }
}

/// Directory-safe form of a location name: `Café Velvet!` becomes `caf__velvet_`.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .take(CLEAN_NAME_MAX_CHARS)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_total_bytes: usize,
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_total_bytes: 50 * 1024 * 1024,
            max_files: 20,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("At least one file required")]
    NoFiles,
    #[error("Maximum {0} files allowed per upload")]
    TooManyFiles(usize),
    #[error("Invalid file type for \"{0}\". Only JPEG, PNG, WebP, and GIF images are allowed.")]
    UnsupportedType(String),
    #[error("File \"{0}\" exceeds {1}MB limit")]
    FileTooLarge(String, usize),
    #[error("Total upload size exceeds {0}MB limit")]
    TotalTooLarge(usize),
}

/// One file received in an upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Set when the file came in a named variant field rather than `files`.
    pub variant: Option<VariantKind>,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// MIME type sniffed from the content, or the declared one when sniffing fails.
    pub fn mime_type(&self) -> Option<String> {
        infer::get(&self.bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| self.content_type.clone())
    }

    /// Lowercased extension of the original filename, `jpg` when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                e.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "jpg".to_string())
    }
}

pub fn validate_uploads(
    files: &[UploadedFile],
    limits: &UploadLimits,
) -> Result<(), UploadRejection> {
    if files.is_empty() {
        return Err(UploadRejection::NoFiles);
    }
    if files.len() > limits.max_files {
        return Err(UploadRejection::TooManyFiles(limits.max_files));
    }

    let mut total = 0usize;
    for file in files {
        let allowed = file
            .mime_type()
            .is_some_and(|mime| ALLOWED_MIME_TYPES.contains(&mime.as_str()));
        if !allowed {
            return Err(UploadRejection::UnsupportedType(file.file_name.clone()));
        }
        if file.bytes.len() > limits.max_file_bytes {
            return Err(UploadRejection::FileTooLarge(
                file.file_name.clone(),
                limits.max_file_bytes / 1024 / 1024,
            ));
        }
        total += file.bytes.len();
    }
    if total > limits.max_total_bytes {
        return Err(UploadRejection::TotalTooLarge(
            limits.max_total_bytes / 1024 / 1024,
        ));
    }
    Ok(())
}

/// A directory reserved for one batch of images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDir {
    pub fs_dir: PathBuf,
    pub public_dir: String,
}

impl StorageDir {
    pub fn file(&self, file_name: &str) -> (PathBuf, String) {
        (
            self.fs_dir.join(file_name),
            format!("{}/{}", self.public_dir, file_name),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ImageStorage {
    images_dir: PathBuf,
}

impl ImageStorage {
    pub fn new<P: Into<PathBuf>>(images_dir: P) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn storage_dir(
        &self,
        location_name: &str,
        source: MediaSource,
        timestamp_ms: i64,
    ) -> StorageDir {
        let relative = format!(
            "{}/{}/{}",
            clean_name(location_name),
            source.dir_name(),
            timestamp_ms
        );
        StorageDir {
            fs_dir: self.images_dir.join(&relative),
            public_dir: format!("{}/{}", PUBLIC_IMAGES_PREFIX, relative),
        }
    }

    /// Filesystem path of a public path produced by this storage.
    pub fn resolve_public_path(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path
            .strip_prefix(PUBLIC_IMAGES_PREFIX)?
            .trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.images_dir.join(relative))
    }

    /// Writes one uploaded file. Typed variants are named after their kind, originals
    /// after their position.
    pub async fn save_upload(
        &self,
        dir: &StorageDir,
        index: usize,
        file: &UploadedFile,
    ) -> Result<(PathBuf, String)> {
        let stem = match file.variant {
            Some(kind) => kind.as_str().to_string(),
            None => format!("image_{}", index),
        };
        let (fs_path, public_path) = dir.file(&format!("{}.{}", stem, file.extension()));

        tokio::fs::create_dir_all(&dir.fs_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", dir.fs_dir))?;
        tokio::fs::write(&fs_path, &file.bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", fs_path))?;
        debug!("Stored {} bytes at {:?}", file.bytes.len(), fs_path);

        Ok((fs_path, public_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn file(name: &str, bytes: Vec<u8>, content_type: Option<&str>) -> UploadedFile {
        UploadedFile {
            variant: None,
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    fn png(name: &str, len: usize) -> UploadedFile {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.resize(len.max(PNG_MAGIC.len()), 0);
        file(name, bytes, Some("application/octet-stream"))
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Andrés DC"), "andr_s_dc");
        assert_eq!(clean_name("Museo del Oro"), "museo_del_oro");
        assert_eq!(clean_name(&"a".repeat(40)).len(), 30);
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn test_storage_dir_layout() {
        let storage = ImageStorage::new("/srv/images");
        let dir = storage.storage_dir("Museo del Oro", MediaSource::Instagram, 1700000000000);
        assert_eq!(
            dir.fs_dir,
            PathBuf::from("/srv/images/museo_del_oro/instagram/1700000000000")
        );
        let (fs_path, public_path) = dir.file("image_0.jpg");
        assert_eq!(
            fs_path,
            PathBuf::from("/srv/images/museo_del_oro/instagram/1700000000000/image_0.jpg")
        );
        assert_eq!(
            public_path,
            "src/data/images/museo_del_oro/instagram/1700000000000/image_0.jpg"
        );
        assert_eq!(storage.resolve_public_path(&public_path), Some(fs_path));
        assert_eq!(storage.resolve_public_path("src/data/images/../etc"), None);
        assert_eq!(storage.resolve_public_path("elsewhere/x.jpg"), None);
    }

    #[test]
    fn test_mime_sniffing_beats_declared_type() {
        assert_eq!(png("a.png", 16).mime_type().as_deref(), Some("image/png"));
        let declared = file("a.jpg", b"????".to_vec(), Some("image/jpeg"));
        assert_eq!(declared.mime_type().as_deref(), Some("image/jpeg"));
        assert_eq!(file("a", b"????".to_vec(), None).mime_type(), None);
    }

    #[test]
    fn test_extension() {
        assert_eq!(png("Photo.PNG", 8).extension(), "png");
        assert_eq!(png("noext", 8).extension(), "jpg");
        assert_eq!(png("weird.j p*g", 8).extension(), "jpg");
    }

    #[test]
    fn test_validate_uploads() {
        let limits = UploadLimits {
            max_file_bytes: 100,
            max_total_bytes: 150,
            max_files: 2,
        };
        assert_eq!(validate_uploads(&[], &limits), Err(UploadRejection::NoFiles));
        assert_eq!(
            validate_uploads(&[png("a", 10), png("b", 10), png("c", 10)], &limits),
            Err(UploadRejection::TooManyFiles(2))
        );
        assert_eq!(
            validate_uploads(&[file("doc.pdf", b"%PDF-1.4".to_vec(), Some("application/pdf"))], &limits),
            Err(UploadRejection::UnsupportedType("doc.pdf".to_string()))
        );
        assert!(matches!(
            validate_uploads(&[png("big", 101)], &limits),
            Err(UploadRejection::FileTooLarge(name, _)) if name == "big"
        ));
        assert!(matches!(
            validate_uploads(&[png("a", 80), png("b", 80)], &limits),
            Err(UploadRejection::TotalTooLarge(_))
        ));
        assert_eq!(validate_uploads(&[png("a", 50), png("b", 50)], &limits), Ok(()));
    }

    #[tokio::test]
    async fn test_save_upload_names_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ImageStorage::new(temp_dir.path());
        let dir = storage.storage_dir("Cafe", MediaSource::Uploads, 42);

        let (original, original_public) = storage
            .save_upload(&dir, 3, &png("shot.png", 20))
            .await
            .unwrap();
        assert!(original.ends_with("cafe/uploads/42/image_3.png"));
        assert_eq!(original_public, "src/data/images/cafe/uploads/42/image_3.png");

        let hero = UploadedFile {
            variant: Some(VariantKind::Hero),
            ..png("cover.webp", 20)
        };
        let (hero_path, _) = storage.save_upload(&dir, 0, &hero).await.unwrap();
        assert!(hero_path.ends_with("cafe/uploads/42/hero.webp"));
        assert_eq!(std::fs::read(&hero_path).unwrap().len(), 20);
    }
}
