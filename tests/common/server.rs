//! Test server lifecycle management

use super::constants::*;
use super::fixtures::create_seeded_store;
use anyhow::Result;
use async_trait::async_trait;
use location_server::enrichment::{
    BigDataCloudClient, GoogleMapsClient, HttpImageDownloader, ImageDownloader,
    InstagramMediaFetcher, RapidApiInstagramClient,
};
use location_server::folder_opener::FolderOpener;
use location_server::locations::MapsEnrichment;
use location_server::media::{ImageStorage, UploadLimits};
use location_server::server::{
    make_app, RequestsLoggingLevel, ServerConfig, ServerDependencies, ServerState,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Records the folders it was asked to open instead of launching an explorer.
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<PathBuf>>,
}

impl FolderOpener for RecordingOpener {
    fn open(&self, path: &Path) -> Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Used when no third party is configured; any download attempt is a test bug.
struct NoDownloads;

#[async_trait]
impl ImageDownloader for NoDownloads {
    async fn download(&self, url: &str, _dest: &Path) -> Result<u64> {
        anyhow::bail!("Unexpected download of {}", url)
    }
}

pub struct TestServerOptions {
    /// Base URL of a [`super::MockServices`] instance standing in for every third party.
    pub third_party_base_url: Option<String>,
    pub upload_limits: UploadLimits,
    pub open_folder_enabled: bool,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            third_party_base_url: None,
            upload_limits: UploadLimits::default(),
            open_folder_enabled: true,
        }
    }
}

/// A location server running on a random port, backed by a temporary directory
/// holding the database and the images.
pub struct TestServer {
    pub base_url: String,
    pub port: u16,
    pub working_dir: PathBuf,
    pub images_dir: PathBuf,
    pub opener: Arc<RecordingOpener>,

    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

fn build_dependencies(
    options: &TestServerOptions,
    images_dir: &Path,
    opener: Arc<RecordingOpener>,
) -> Result<ServerDependencies> {
    let (maps_enrichment, instagram_fetcher, image_downloader) =
        match &options.third_party_base_url {
            Some(base_url) => {
                let google = Arc::new(GoogleMapsClient::new(
                    base_url.clone(),
                    "test-key".to_string(),
                    REQUEST_TIMEOUT_SECS,
                )?);
                let enrichment = MapsEnrichment {
                    geocoder: Some(google.clone()),
                    place_details: Some(google),
                    reverse_geocoder: Some(Arc::new(BigDataCloudClient::new(
                        base_url.clone(),
                        REQUEST_TIMEOUT_SECS,
                    )?)),
                };
                let fetcher = RapidApiInstagramClient::new(
                    base_url.clone(),
                    "test-key".to_string(),
                    REQUEST_TIMEOUT_SECS,
                )?;
                let downloader: Arc<dyn ImageDownloader> =
                    Arc::new(HttpImageDownloader::new(REQUEST_TIMEOUT_SECS)?);
                (
                    enrichment,
                    Some(Arc::new(fetcher) as Arc<dyn InstagramMediaFetcher>),
                    downloader,
                )
            }
            None => (
                MapsEnrichment::none(),
                None,
                Arc::new(NoDownloads) as Arc<dyn ImageDownloader>,
            ),
        };

    Ok(ServerDependencies {
        storage: ImageStorage::new(images_dir),
        maps_enrichment,
        instagram_fetcher,
        image_downloader,
        upload_limits: options.upload_limits,
        folder_opener: if options.open_folder_enabled {
            Some(opener as Arc<dyn FolderOpener>)
        } else {
            None
        },
    })
}

impl TestServer {
    /// Spawns a server with no third parties configured.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let working_dir = temp_dir.path().to_path_buf();
        let images_dir = working_dir.join("images");
        std::fs::create_dir_all(&images_dir).expect("Failed to create images dir");

        let store = Arc::new(
            create_seeded_store(&working_dir.join("locations.db"))
                .expect("Failed to create location store"),
        );

        let opener = Arc::new(RecordingOpener::default());
        let deps = build_dependencies(&options, &images_dir, opener.clone())
            .expect("Failed to build server dependencies");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().expect("No local address").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            images_dir: images_dir.clone(),
            working_dir: working_dir.clone(),
            ..Default::default()
        };
        let state = ServerState::new(config, "test".to_string(), store, deps);
        let app = make_app(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            working_dir,
            images_dir,
            opener,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server
            .wait_for_ready()
            .await
            .expect("Server failed to become ready");
        server
    }

    async fn wait_for_ready(&self) -> Result<()> {
        let client = reqwest::Client::new();
        let health_url = format!("{}/api/health", self.base_url);
        let attempts = SERVER_READY_TIMEOUT_MS / SERVER_READY_POLL_INTERVAL_MS;

        for _ in 0..attempts {
            if let Ok(response) = client.get(&health_url).send().await {
                if response.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }

        anyhow::bail!(
            "Server did not become ready within {}ms",
            SERVER_READY_TIMEOUT_MS
        )
    }

    pub fn opened_folders(&self) -> Vec<PathBuf> {
        self.opener.opened.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
