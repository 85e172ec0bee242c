//! Location Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod enrichment;
pub mod error;
pub mod folder_opener;
pub mod location_store;
pub mod locations;
pub mod media;
pub mod server;
pub mod sqlite_persistence;
pub mod taxonomy;

// Re-export commonly used types for convenience
pub use error::{ApiError, ApiResult};
pub use location_store::{LocationStore, SqliteLocationStore, TaxonomyStore};
pub use server::{run_server, RequestsLoggingLevel};

/// Revision the binary was built from, `unknown` outside a git checkout.
pub const BUILD_REVISION: &str = env!("BUILD_REVISION");
