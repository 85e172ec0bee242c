pub mod config;
mod envelope;
mod files_routes;
mod http_layers;
mod location_routes;
pub mod metrics;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;
mod taxonomy_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::{ServerDependencies, ServerState};
