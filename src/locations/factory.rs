//! Builds new location entries for each of the three creation flows.

use crate::enrichment::{
    extract_instagram_data, normalize_instagram, Geocoder, PlaceDetailsProvider, ReverseGeocoder,
};
use crate::location_store::{
    Location, LocationCategory, LocationEntry, LocationStatus, LocationType,
};
use crate::server::metrics::record_enrichment_failure;
use std::sync::Arc;
use tracing::{debug, warn};

pub const INSTAGRAM_ADDRESS: &str = "Instagram Embed";
pub const UPLOAD_ADDRESS: &str = "Direct Upload";

/// Google Maps search link for a place.
pub fn maps_url(name: &str, address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(&format!("{} {}", name, address))
    )
}

/// Lookups used to fill in a new `maps` location. Any of them may be missing.
#[derive(Clone, Default)]
pub struct MapsEnrichment {
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub place_details: Option<Arc<dyn PlaceDetailsProvider>>,
    pub reverse_geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

impl MapsEnrichment {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Builds a `maps` entry and enriches it on a best-effort basis. Every lookup failure
/// is logged and skipped, so this always returns an entry.
pub async fn create_from_maps(
    name: &str,
    address: &str,
    category: LocationCategory,
    enrichment: &MapsEnrichment,
) -> LocationEntry {
    let mut entry = LocationEntry {
        name: name.to_string(),
        address: address.to_string(),
        url: maps_url(name, address),
        location_type: LocationType::Maps,
        category,
        status: LocationStatus::Complete,
        ..Default::default()
    };

    if let Some(geocoder) = &enrichment.geocoder {
        match geocoder.geocode(address).await {
            Ok(Some(coords)) => {
                entry.lat = Some(coords.lat);
                entry.lng = Some(coords.lng);
                entry.country_code = coords.country_code;
            }
            Ok(None) => debug!("No geocoding result for '{}'", address),
            Err(err) => {
                warn!("Failed to geocode '{}': {:#}", address, err);
                record_enrichment_failure("geocode");
            }
        }
    }

    if let (Some(reverse_geocoder), Some(lat), Some(lng)) =
        (&enrichment.reverse_geocoder, entry.lat, entry.lng)
    {
        match reverse_geocoder.reverse_geocode(lat, lng).await {
            Ok(Some(result)) => entry.location_key = result.location_key,
            Ok(None) => {}
            Err(err) => {
                warn!("Failed to reverse geocode ({}, {}): {:#}", lat, lng, err);
                record_enrichment_failure("reverse_geocode");
            }
        }
    }

    if let Some(place_details) = &enrichment.place_details {
        match place_details.place_details(name, address).await {
            Ok(Some(details)) => {
                if let Some(formatted_address) = details.formatted_address {
                    entry.contact_address = Some(formatted_address);
                }
                if let Some(official_name) = details.name.filter(|n| n != name) {
                    entry.name = official_name;
                }
                if details.website.is_some() {
                    entry.website = details.website;
                }
                if details.phone_number.is_some() {
                    entry.phone_number = details.phone_number;
                }
            }
            Ok(None) => debug!("No place details for '{}'", name),
            Err(err) => {
                warn!("Failed to fetch place details for '{}': {:#}", name, err);
                record_enrichment_failure("place_details");
            }
        }
    }

    entry
}

/// Builds a draft `instagram` child of `parent` from pasted embed markup, or `None`
/// when the markup carries no post permalink.
pub fn create_from_instagram(
    embed_code: &str,
    parent: &Location,
    timestamp_ms: i64,
) -> Option<LocationEntry> {
    let embed = extract_instagram_data(embed_code);
    let url = embed.url?;
    let name = match &embed.author {
        Some(author) => format!("{}_{}", author, timestamp_ms),
        None => format!("Instagram_{}", timestamp_ms),
    };

    Some(LocationEntry {
        name,
        address: INSTAGRAM_ADDRESS.to_string(),
        url,
        embed_code: Some(embed_code.to_string()),
        instagram: normalize_instagram(embed.author.as_deref()),
        parent_id: Some(parent.id),
        location_type: LocationType::Instagram,
        category: parent.entry.category,
        status: LocationStatus::Draft,
        ..Default::default()
    })
}

/// Builds a draft `upload` child of `parent`.
pub fn create_from_upload(parent: &Location, timestamp_ms: i64) -> LocationEntry {
    LocationEntry {
        name: format!("Upload {}", timestamp_ms),
        address: UPLOAD_ADDRESS.to_string(),
        parent_id: Some(parent.id),
        location_type: LocationType::Upload,
        category: parent.entry.category,
        status: LocationStatus::Draft,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{GeocodeResult, PlaceDetails, ReverseGeocodeResult};
    use crate::taxonomy::LocationKey;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct BrokenGeocoder;

    #[async_trait]
    impl Geocoder for BrokenGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<GeocodeResult>> {
            Err(anyhow!("connection refused"))
        }
    }

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<GeocodeResult>> {
            Ok(Some(GeocodeResult {
                lat: 4.6,
                lng: -74.07,
                country_code: Some("CO".to_string()),
            }))
        }
    }

    struct FixedReverse;

    #[async_trait]
    impl ReverseGeocoder for FixedReverse {
        async fn reverse_geocode(&self, _lat: f64, _lng: f64) -> Result<Option<ReverseGeocodeResult>> {
            Ok(Some(ReverseGeocodeResult {
                location_key: LocationKey::parse("colombia|bogota|chapinero"),
                ..Default::default()
            }))
        }
    }

    struct FixedDetails;

    #[async_trait]
    impl PlaceDetailsProvider for FixedDetails {
        async fn place_details(&self, _name: &str, _address: &str) -> Result<Option<PlaceDetails>> {
            Ok(Some(PlaceDetails {
                name: Some("Andrés Carne de Res".to_string()),
                formatted_address: Some("Cl. 82 #12-21, Bogotá".to_string()),
                website: Some("https://andrescarnederes.com".to_string()),
                phone_number: Some("+57 601 8612233".to_string()),
            }))
        }
    }

    fn parent() -> Location {
        Location {
            id: 9,
            entry: LocationEntry {
                name: "Museo del Oro".to_string(),
                address: "Cra. 6 #15-88".to_string(),
                category: LocationCategory::Attractions,
                ..Default::default()
            },
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_maps_url_encodes_query() {
        assert_eq!(
            maps_url("Café Velvet", "Calle 1 #2"),
            "https://www.google.com/maps/search/?api=1&query=Caf%C3%A9%20Velvet%20Calle%201%20%232"
        );
    }

    #[tokio::test]
    async fn test_broken_geocoder_still_yields_location() {
        let enrichment = MapsEnrichment {
            geocoder: Some(Arc::new(BrokenGeocoder)),
            reverse_geocoder: Some(Arc::new(FixedReverse)),
            ..Default::default()
        };
        let entry = create_from_maps("Museo", "Bogotá", LocationCategory::Attractions, &enrichment).await;

        assert_eq!(entry.name, "Museo");
        assert_eq!(entry.lat, None);
        assert_eq!(entry.lng, None);
        assert_eq!(entry.location_key, None);
        assert_eq!(entry.location_type, LocationType::Maps);
        assert_eq!(entry.status, LocationStatus::Complete);
        assert!(entry.url.starts_with("https://www.google.com/maps/search/"));
    }

    #[tokio::test]
    async fn test_without_enrichment_only_builds_url() {
        let entry =
            create_from_maps("Museo", "Bogotá", LocationCategory::Dining, &MapsEnrichment::none()).await;
        assert_eq!(entry.category, LocationCategory::Dining);
        assert_eq!(entry.country_code, None);
        assert_eq!(entry.contact_address, None);
    }

    #[tokio::test]
    async fn test_full_enrichment() {
        let enrichment = MapsEnrichment {
            geocoder: Some(Arc::new(FixedGeocoder)),
            place_details: Some(Arc::new(FixedDetails)),
            reverse_geocoder: Some(Arc::new(FixedReverse)),
        };
        let entry = create_from_maps("andres", "Calle 82", LocationCategory::Dining, &enrichment).await;

        assert_eq!(entry.lat, Some(4.6));
        assert_eq!(entry.country_code.as_deref(), Some("CO"));
        assert_eq!(
            entry.location_key.map(|k| k.to_string()).as_deref(),
            Some("colombia|bogota|chapinero")
        );
        assert_eq!(entry.name, "Andrés Carne de Res");
        assert_eq!(entry.contact_address.as_deref(), Some("Cl. 82 #12-21, Bogotá"));
        assert_eq!(entry.phone_number.as_deref(), Some("+57 601 8612233"));
        // The url keeps the name the operator typed
        assert!(entry.url.contains("andres"));
    }

    #[test]
    fn test_instagram_child() {
        let embed = r#"<blockquote data-instgrm-permalink="https://www.instagram.com/p/XYZ/?igsh=1"><p>A post shared by @museodeloro</p></blockquote>"#;
        let entry = create_from_instagram(embed, &parent(), 1700000000000).unwrap();

        assert_eq!(entry.name, "@museodeloro_1700000000000");
        assert_eq!(entry.address, INSTAGRAM_ADDRESS);
        assert_eq!(entry.url, "https://www.instagram.com/p/XYZ/");
        assert_eq!(
            entry.instagram.as_deref(),
            Some("https://www.instagram.com/museodeloro/")
        );
        assert_eq!(entry.parent_id, Some(9));
        assert_eq!(entry.category, LocationCategory::Attractions);
        assert_eq!(entry.status, LocationStatus::Draft);

        let anonymous = create_from_instagram(
            r#"<blockquote data-instgrm-permalink="https://www.instagram.com/reel/R1/"></blockquote>"#,
            &parent(),
            5,
        )
        .unwrap();
        assert_eq!(anonymous.name, "Instagram_5");
        assert_eq!(anonymous.instagram, None);
        assert_eq!(anonymous.url, "https://www.instagram.com/reel/R1/");

        assert_eq!(create_from_instagram("<div></div>", &parent(), 5), None);
    }

    #[test]
    fn test_upload_child() {
        let entry = create_from_upload(&parent(), 77);
        assert_eq!(entry.name, "Upload 77");
        assert_eq!(entry.address, UPLOAD_ADDRESS);
        assert_eq!(entry.location_type, LocationType::Upload);
        assert_eq!(entry.parent_id, Some(9));
        assert_eq!(entry.status, LocationStatus::Draft);
    }
}
