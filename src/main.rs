use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import modules from the library crate
use location_server::config;
use location_server::enrichment::{
    BigDataCloudClient, GoogleMapsClient, HttpImageDownloader, InstagramMediaFetcher,
    RapidApiInstagramClient,
};
use location_server::folder_opener::{FolderOpener, SystemFolderOpener};
use location_server::location_store::{LocationStore, SqliteLocationStore};
use location_server::locations::{seed_taxonomy_if_empty, MapsEnrichment};
use location_server::media::ImageStorage;
use location_server::server::{
    metrics, run_server, RequestsLoggingLevel, ServerConfig, ServerDependencies, ServerState,
};
use location_server::BUILD_REVISION;

/// Headroom over the upload limit for multipart framing and text fields.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file. Created when missing.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Directory where location images are stored. Defaults to `images` next to the database.
    #[clap(long, value_parser = parse_path)]
    pub images_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Google Maps key for geocoding and place details.
    #[clap(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    pub google_maps_api_key: Option<String>,

    /// RapidAPI key for fetching Instagram media.
    #[clap(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub rapid_api_key: Option<String>,

    /// Timeout in seconds for requests to third-party services.
    #[clap(long, default_value_t = 30)]
    pub http_timeout_sec: u64,

    /// Disables the endpoint that opens folders in the desktop file explorer.
    #[clap(long)]
    pub disable_open_folder: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            images_dir: args.images_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            google_maps_api_key: args.google_maps_api_key.clone(),
            rapid_api_key: args.rapid_api_key.clone(),
            http_timeout_sec: args.http_timeout_sec,
            open_folder_enabled: !args.disable_open_folder,
        }
    }
}

fn build_maps_enrichment(app_config: &config::AppConfig) -> Result<MapsEnrichment> {
    let timeout = app_config.http_timeout_sec;
    let reverse_geocoder = Arc::new(BigDataCloudClient::new(
        app_config.endpoints.bigdatacloud_base_url.clone(),
        timeout,
    )?);

    let Some(api_key) = &app_config.google_maps_api_key else {
        warn!("GOOGLE_MAPS_API_KEY not set, maps locations will not be geocoded");
        return Ok(MapsEnrichment {
            reverse_geocoder: Some(reverse_geocoder),
            ..MapsEnrichment::none()
        });
    };
    let google = Arc::new(GoogleMapsClient::new(
        app_config.endpoints.google_maps_base_url.clone(),
        api_key.clone(),
        timeout,
    )?);
    info!("Google Maps enrichment enabled via {}", google.base_url());

    Ok(MapsEnrichment {
        geocoder: Some(google.clone()),
        place_details: Some(google),
        reverse_geocoder: Some(reverse_geocoder),
    })
}

fn build_instagram_fetcher(
    app_config: &config::AppConfig,
) -> Result<Option<Arc<dyn InstagramMediaFetcher>>> {
    let Some(api_key) = &app_config.rapid_api_key else {
        warn!("RAPIDAPI_KEY not set, Instagram embeds will be saved without media");
        return Ok(None);
    };
    let client = RapidApiInstagramClient::new(
        app_config.endpoints.rapidapi_instagram_base_url.clone(),
        api_key.clone(),
        app_config.http_timeout_sec,
    )?;
    info!("Instagram media fetch enabled via {}", client.api_host());
    Ok(Some(Arc::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  images_dir: {:?}", app_config.images_dir);
    info!("  port: {}", app_config.port);

    if !app_config.db_path.exists() {
        info!("Creating new database at {:?}", app_config.db_path);
    }
    let store = Arc::new(SqliteLocationStore::new(&app_config.db_path)?);

    let seeded = seed_taxonomy_if_empty(store.as_ref())?;
    if seeded > 0 {
        info!("Seeded location taxonomy with {} entries", seeded);
    }

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_location_counts(&store.count_by_type()?);

    let folder_opener: Option<Arc<dyn FolderOpener>> = if app_config.open_folder_enabled {
        Some(Arc::new(SystemFolderOpener))
    } else {
        info!("Open folder endpoint disabled");
        None
    };

    let dependencies = ServerDependencies {
        storage: ImageStorage::new(&app_config.images_dir),
        maps_enrichment: build_maps_enrichment(&app_config)?,
        instagram_fetcher: build_instagram_fetcher(&app_config)?,
        image_downloader: Arc::new(HttpImageDownloader::new(app_config.http_timeout_sec)?),
        upload_limits: app_config.upload_limits,
        folder_opener,
    };
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        images_dir: app_config.images_dir.clone(),
        working_dir: std::env::current_dir()?,
        max_body_bytes: app_config.upload_limits.max_total_bytes + BODY_LIMIT_HEADROOM,
    };
    let state = ServerState::new(
        server_config,
        BUILD_REVISION.to_string(),
        store,
        dependencies,
    );

    info!("Build revision {}", BUILD_REVISION);
    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(state).await
}
