mod file_config;

pub use file_config::{EndpointsConfig, FileConfig, UploadsConfig};

use crate::enrichment::{
    DEFAULT_BIGDATACLOUD_BASE_URL, DEFAULT_GOOGLE_MAPS_BASE_URL,
    DEFAULT_RAPIDAPI_INSTAGRAM_BASE_URL,
};
use crate::media::UploadLimits;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

const MB: usize = 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub google_maps_api_key: Option<String>,
    pub rapid_api_key: Option<String>,
    pub http_timeout_sec: u64,
    pub open_folder_enabled: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            images_dir: None,
            port: 3000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            google_maps_api_key: None,
            rapid_api_key: None,
            http_timeout_sec: 30,
            open_folder_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_path: PathBuf,
    pub images_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub http_timeout_sec: u64,
    pub open_folder_enabled: bool,

    // Third-party credentials, `None` disables the matching enrichment
    pub google_maps_api_key: Option<String>,
    pub rapid_api_key: Option<String>,

    // Feature configs (with defaults)
    pub endpoints: EndpointSettings,
    pub upload_limits: UploadLimits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub google_maps_base_url: String,
    pub bigdatacloud_base_url: String,
    pub rapidapi_instagram_base_url: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            google_maps_base_url: DEFAULT_GOOGLE_MAPS_BASE_URL.to_string(),
            bigdatacloud_base_url: DEFAULT_BIGDATACLOUD_BASE_URL.to_string(),
            rapidapi_instagram_base_url: DEFAULT_RAPIDAPI_INSTAGRAM_BASE_URL.to_string(),
        }
    }
}

/// Keys set to an empty string (e.g. `GOOGLE_MAPS_API_KEY=`) count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        // The database file may not exist yet, its directory must
        let db_dir = match db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("Database parent is not a directory: {:?}", db_dir);
        }

        let images_dir = file
            .images_dir
            .map(PathBuf::from)
            .or_else(|| cli.images_dir.clone())
            .unwrap_or_else(|| db_dir.join("images"));
        ensure_images_dir(&images_dir)?;

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let http_timeout_sec = file.http_timeout_sec.unwrap_or(cli.http_timeout_sec);
        let open_folder_enabled = file.open_folder_enabled.unwrap_or(cli.open_folder_enabled);

        let google_maps_api_key =
            non_empty(file.google_maps_api_key).or_else(|| non_empty(cli.google_maps_api_key.clone()));
        let rapid_api_key =
            non_empty(file.rapid_api_key).or_else(|| non_empty(cli.rapid_api_key.clone()));

        // Endpoints - merge file config with defaults
        let endpoints_file = file.endpoints.unwrap_or_default();
        let defaults = EndpointSettings::default();
        let endpoints = EndpointSettings {
            google_maps_base_url: endpoints_file
                .google_maps
                .unwrap_or(defaults.google_maps_base_url),
            bigdatacloud_base_url: endpoints_file
                .bigdatacloud
                .unwrap_or(defaults.bigdatacloud_base_url),
            rapidapi_instagram_base_url: endpoints_file
                .rapidapi_instagram
                .unwrap_or(defaults.rapidapi_instagram_base_url),
        };

        let uploads_file = file.uploads.unwrap_or_default();
        let default_limits = UploadLimits::default();
        let upload_limits = UploadLimits {
            max_file_bytes: uploads_file
                .max_file_mb
                .map(|mb| mb * MB)
                .unwrap_or(default_limits.max_file_bytes),
            max_total_bytes: uploads_file
                .max_total_mb
                .map(|mb| mb * MB)
                .unwrap_or(default_limits.max_total_bytes),
            max_files: uploads_file.max_files.unwrap_or(default_limits.max_files),
        };
        if upload_limits.max_file_bytes > upload_limits.max_total_bytes {
            bail!("uploads.max_file_mb cannot exceed uploads.max_total_mb");
        }

        Ok(Self {
            db_path,
            images_dir,
            port,
            metrics_port,
            logging_level,
            http_timeout_sec,
            open_folder_enabled,
            google_maps_api_key,
            rapid_api_key,
            endpoints,
            upload_limits,
        })
    }
}

fn ensure_images_dir(images_dir: &Path) -> Result<()> {
    if images_dir.exists() && !images_dir.is_dir() {
        bail!("images_dir is not a directory: {:?}", images_dir);
    }
    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create images directory {:?}", images_dir))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
