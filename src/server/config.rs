use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Served under `/src/data/images`.
    pub images_dir: PathBuf,
    /// Root that `/api/open-folder` paths are resolved against.
    pub working_dir: PathBuf,
    /// Request body cap, sized for the largest accepted upload.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3000,
            metrics_port: 9091,
            images_dir: PathBuf::from("images"),
            working_dir: PathBuf::from("."),
            max_body_bytes: 60 * 1024 * 1024,
        }
    }
}
