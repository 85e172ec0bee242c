//! Shared constants for end-to-end tests
//!
//! When fixture data or mock payloads change, update only this file.

// ============================================================================
// Locations
// ============================================================================

pub const MUSEUM_NAME: &str = "Museo del Oro";
pub const MUSEUM_ADDRESS: &str = "Cra. 6 #15-88, Bogotá";

pub const CAFE_NAME: &str = "Café San Alberto";
pub const CAFE_ADDRESS: &str = "Cl. 10 #4-21, Cartagena";

/// Instagram embed as pasted from the "Embed" dialog
pub const INSTAGRAM_EMBED: &str = r#"<blockquote class="instagram-media" data-instgrm-permalink="https://www.instagram.com/p/C0ffee123/?utm_source=ig_embed&amp;utm_campaign=loading" data-instgrm-version="14"><div><a href="https://www.instagram.com/p/C0ffee123/">A post shared by @museodeloro (Museo del Oro)</a></div></blockquote>"#;

pub const INSTAGRAM_PERMALINK: &str = "https://www.instagram.com/p/C0ffee123/";

// ============================================================================
// Mocked third parties
// ============================================================================

pub const MOCK_LAT: f64 = 4.6019;
pub const MOCK_LNG: f64 = -74.0719;
pub const MOCK_COUNTRY_CODE: &str = "CO";

/// Number of carousel items the mocked RapidAPI returns
pub const MOCK_CAROUSEL_SIZE: usize = 3;

// ============================================================================
// Timing
// ============================================================================

/// Maximum time to wait for server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Default request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval while waiting for the server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
