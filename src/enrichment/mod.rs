//! Third-party lookups used to fill in location fields.
//!
//! Every adapter sits behind a trait so services can run with any subset configured
//! and tests can swap in hand-written fakes. Callers treat failures as "no data".

mod bigdatacloud;
mod downloader;
mod google_maps;
mod instagram;
#[cfg(test)]
mod test_support;

pub use bigdatacloud::{BigDataCloudClient, DEFAULT_BIGDATACLOUD_BASE_URL};
pub use downloader::HttpImageDownloader;
pub use google_maps::{GoogleMapsClient, DEFAULT_GOOGLE_MAPS_BASE_URL};
pub use instagram::{
    extract_instagram_data, normalize_instagram, parse_media_response, InstagramEmbedData,
    RapidApiInstagramClient, DEFAULT_RAPIDAPI_INSTAGRAM_BASE_URL,
};

use crate::taxonomy::LocationKey;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    /// ISO 3166-1 alpha-2 code of the country component, when present.
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub website: Option<String>,
    /// International format when available, local format otherwise.
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGeocodeResult {
    pub country_name: String,
    pub country_code: String,
    pub city: String,
    pub locality: String,
    pub location_key: Option<LocationKey>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>>;
}

#[async_trait]
pub trait PlaceDetailsProvider: Send + Sync {
    async fn place_details(&self, name: &str, address: &str) -> Result<Option<PlaceDetails>>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<ReverseGeocodeResult>>;
}

#[async_trait]
pub trait InstagramMediaFetcher: Send + Sync {
    /// Image URLs of a post, in carousel order.
    async fn fetch_media_urls(&self, post_url: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait ImageDownloader: Send + Sync {
    /// Writes the body of `url` to `dest` and returns the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

pub(crate) fn build_http_client(timeout_sec: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_sec))
        .build()
        .context("Failed to create HTTP client")
}
