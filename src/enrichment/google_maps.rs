//! Google Maps Geocoding and Places clients.

use super::{build_http_client, GeocodeResult, Geocoder, PlaceDetails, PlaceDetailsProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";

const PLACE_DETAILS_FIELDS: &str =
    "name,formatted_address,website,international_phone_number,formatted_phone_number";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeEntry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct TextSearchEntry {
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    name: Option<String>,
    formatted_address: Option<String>,
    website: Option<String>,
    international_phone_number: Option<String>,
    formatted_phone_number: Option<String>,
}

/// Client for the Google Maps web services used while creating `maps` locations.
pub struct GoogleMapsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsClient {
    pub fn new(base_url: String, api_key: String, timeout_sec: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_sec)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to reach Google Maps at {}", path))?;

        if !response.status().is_success() {
            anyhow::bail!("Google Maps {} returned status {}", path, response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Google Maps {} response", path))
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>> {
        let response: GeocodeResponse = self
            .get_json("/maps/api/geocode/json", &[("address", address)])
            .await?;
        debug!(
            "Geocode of '{}' returned status {} with {} results",
            address,
            response.status,
            response.results.len()
        );

        if response.status != "OK" {
            return Ok(None);
        }
        let Some(first) = response.results.into_iter().next() else {
            return Ok(None);
        };
        let country_code = first
            .address_components
            .into_iter()
            .find(|c| c.types.iter().any(|t| t == "country"))
            .map(|c| c.short_name);

        Ok(Some(GeocodeResult {
            lat: first.geometry.location.lat,
            lng: first.geometry.location.lng,
            country_code,
        }))
    }
}

#[async_trait]
impl PlaceDetailsProvider for GoogleMapsClient {
    async fn place_details(&self, name: &str, address: &str) -> Result<Option<PlaceDetails>> {
        let query = format!("{} {}", name, address);
        let search: TextSearchResponse = self
            .get_json("/maps/api/place/textsearch/json", &[("query", query.as_str())])
            .await?;
        if search.status != "OK" {
            debug!("Place search for '{}' returned {}", query, search.status);
            return Ok(None);
        }
        let Some(place) = search.results.into_iter().next() else {
            return Ok(None);
        };

        let details: DetailsResponse = self
            .get_json(
                "/maps/api/place/details/json",
                &[
                    ("place_id", place.place_id.as_str()),
                    ("fields", PLACE_DETAILS_FIELDS),
                ],
            )
            .await?;
        if details.status != "OK" {
            return Ok(None);
        }

        Ok(details.result.map(|r| PlaceDetails {
            name: r.name,
            formatted_address: r.formatted_address,
            website: r.website,
            phone_number: r.international_phone_number.or(r.formatted_phone_number),
        }))
    }
}
