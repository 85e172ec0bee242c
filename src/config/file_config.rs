use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub images_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub rapid_api_key: Option<String>,
    pub http_timeout_sec: Option<u64>,
    pub open_folder_enabled: Option<bool>,

    // Feature configs
    pub endpoints: Option<EndpointsConfig>,
    pub uploads: Option<UploadsConfig>,
}

/// Base URLs of the third-party services, for proxies and test doubles.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub google_maps: Option<String>,
    pub bigdatacloud: Option<String>,
    pub rapidapi_instagram: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UploadsConfig {
    pub max_file_mb: Option<usize>,
    pub max_total_mb: Option<usize>,
    pub max_files: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
