//! BigDataCloud client-side reverse geocoding, used to suggest a location key.

use super::{build_http_client, ReverseGeocodeResult, ReverseGeocoder};
use crate::taxonomy::{slugify_segment, LocationKey};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BIGDATACLOUD_BASE_URL: &str = "https://api.bigdatacloud.net";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocodeResponse {
    country_name: Option<String>,
    country_code: Option<String>,
    city: Option<String>,
    locality: Option<String>,
}

pub struct BigDataCloudClient {
    client: reqwest::Client,
    base_url: String,
}

/// Slugs country, city and locality into a key, skipping parts that slug to nothing.
fn location_key_from_names(names: [Option<&str>; 3]) -> Option<LocationKey> {
    let segments: Vec<String> = names.into_iter().flatten().filter_map(slugify_segment).collect();
    if segments.is_empty() {
        return None;
    }
    LocationKey::from_segments(&segments).ok()
}

impl BigDataCloudClient {
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_sec)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudClient {
    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<ReverseGeocodeResult>> {
        let url = format!("{}/data/reverse-geocode-client", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lng.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await
            .context("Failed to reach BigDataCloud")?;

        if !response.status().is_success() {
            anyhow::bail!("BigDataCloud returned status {}", response.status());
        }

        let data: ReverseGeocodeResponse = response
            .json()
            .await
            .context("Failed to parse BigDataCloud response")?;

        let location_key = location_key_from_names([
            data.country_name.as_deref(),
            data.city.as_deref(),
            data.locality.as_deref(),
        ]);
        debug!(
            "Reverse geocoded ({}, {}) to {:?}",
            lat,
            lng,
            location_key.as_ref().map(|k| k.to_string())
        );

        Ok(Some(ReverseGeocodeResult {
            country_name: data.country_name.unwrap_or_default(),
            country_code: data.country_code.unwrap_or_default(),
            city: data.city.unwrap_or_default(),
            locality: data.locality.unwrap_or_default(),
            location_key,
        }))
    }
}
