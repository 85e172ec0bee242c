//! Manual entry and editing of Google Maps places.

use super::factory::{create_from_maps, maps_url, MapsEnrichment};
use super::refresh_location_metrics;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::location_store::{
    is_unique_violation, DiningType, Location, LocationCategory, LocationPatch, LocationStore,
    LocationType,
};
use crate::server::metrics::record_enrichment_failure;
use crate::taxonomy::LocationKey;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{info, warn};

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMapsRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "dining_type")]
    pub dining_type: Option<String>,
    pub contact_address: Option<String>,
    pub country_code: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub location_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMapsRequest {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "dining_type")]
    pub dining_type: Option<String>,
    pub contact_address: Option<String>,
    pub country_code: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    /// `Some(None)` when the client sent `null` to clear the key.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub location_key: Option<Option<String>>,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_dining_type(raw: &Option<String>, errors: &mut Vec<FieldError>) -> Option<DiningType> {
    let raw = trimmed(raw)?;
    let parsed = DiningType::parse(&raw);
    if parsed.is_none() {
        errors.push(FieldError::new("dining_type", format!("Unknown dining type '{}'", raw)));
    }
    parsed
}

fn parse_location_key(raw: &str, errors: &mut Vec<FieldError>) -> Option<LocationKey> {
    match raw.trim().parse::<LocationKey>() {
        Ok(key) => Some(key),
        Err(err) => {
            errors.push(FieldError::new("locationKey", err.to_string()));
            None
        }
    }
}

fn validate_country_code(raw: &Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    let code = trimmed(raw)?;
    if code.chars().count() != 2 {
        errors.push(FieldError::new(
            "countryCode",
            "Country code must be 2 characters",
        ));
        return None;
    }
    Some(code)
}

fn validate_website(raw: &Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    let website = trimmed(raw)?;
    match reqwest::Url::parse(&website) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(website),
        _ => {
            errors.push(FieldError::new("website", "Website must be a valid URL"));
            None
        }
    }
}

pub struct MapsService {
    store: Arc<dyn LocationStore>,
    enrichment: MapsEnrichment,
}

impl MapsService {
    pub fn new(store: Arc<dyn LocationStore>, enrichment: MapsEnrichment) -> Self {
        Self { store, enrichment }
    }

    pub async fn add(&self, request: AddMapsRequest) -> ApiResult<Location> {
        let mut errors = Vec::new();
        let name = trimmed(&request.name);
        if name.is_none() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        let address = trimmed(&request.address);
        if address.is_none() {
            errors.push(FieldError::new("address", "Address is required"));
        }
        let dining_type = parse_dining_type(&request.dining_type, &mut errors);
        let country_code = validate_country_code(&request.country_code, &mut errors);
        let website = validate_website(&request.website, &mut errors);
        let location_key = trimmed(&request.location_key)
            .and_then(|raw| parse_location_key(&raw, &mut errors));
        let (Some(name), Some(address)) = (name, address) else {
            return Err(ApiError::validation(errors));
        };
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let category = request
            .category
            .as_deref()
            .and_then(LocationCategory::parse)
            .unwrap_or_default();

        let mut entry = create_from_maps(&name, &address, category, &self.enrichment).await;

        entry.title = trimmed(&request.title);
        entry.dining_type = dining_type;
        entry.contact_address = trimmed(&request.contact_address).or(entry.contact_address);
        entry.country_code = country_code.or(entry.country_code);
        entry.phone_number = trimmed(&request.phone_number).or(entry.phone_number);
        entry.website = website.or(entry.website);
        entry.location_key = location_key.or(entry.location_key);

        let id = self.store.save(&entry)?;
        info!("Added maps location '{}' as {}", entry.name, id);
        refresh_location_metrics(self.store.as_ref());

        self.store
            .get_by_id(id)?
            .ok_or_else(|| ApiError::Internal(format!("Location {} vanished after save", id)))
    }

    pub async fn update(&self, request: UpdateMapsRequest) -> ApiResult<Location> {
        let mut errors = Vec::new();
        let id = request.id.filter(|id| *id > 0);
        if id.is_none() {
            errors.push(FieldError::new("id", "Location ID is required"));
        }
        let title = trimmed(&request.title);
        if title.is_none() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        let category = match request.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = LocationCategory::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new("category", format!("Invalid category '{}'", raw)));
                }
                parsed
            }
        };
        let dining_type = parse_dining_type(&request.dining_type, &mut errors);
        let country_code = validate_country_code(&request.country_code, &mut errors);
        let website = validate_website(&request.website, &mut errors);
        let location_key = match &request.location_key {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => parse_location_key(raw, &mut errors).map(Some),
        };
        let (Some(id), Some(title)) = (id, title) else {
            return Err(ApiError::validation(errors));
        };
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let current = self
            .store
            .get_by_id(id)?
            .filter(|l| l.entry.location_type == LocationType::Maps)
            .ok_or_else(|| ApiError::not_found("Location", id))?;

        let name = trimmed(&request.name);
        let address = trimmed(&request.address);
        let mut patch = LocationPatch {
            title: Some(title),
            category,
            dining_type,
            contact_address: trimmed(&request.contact_address),
            country_code,
            phone_number: trimmed(&request.phone_number),
            website,
            location_key,
            ..Default::default()
        };

        if let (Some(name), Some(address)) = (&name, &address) {
            patch.url = Some(maps_url(name, address));
        }
        if let Some(address) = address.as_ref().filter(|a| **a != current.entry.address) {
            self.regeocode(address, &mut patch).await;
        }
        patch.name = name;
        patch.address = address;

        match self.store.update_by_id(id, &patch) {
            Ok(true) => {}
            Ok(false) => {
                return Err(ApiError::Internal(format!("Failed to update location {}", id)))
            }
            Err(err) if is_unique_violation(&err) => {
                let message = "Another location already has this name and address";
                return Err(ApiError::validation(vec![
                    FieldError::new("name", message),
                    FieldError::new("address", message),
                ]));
            }
            Err(err) => return Err(err.into()),
        }
        info!("Updated maps location {}", id);

        self.store
            .get_by_id(id)?
            .ok_or_else(|| ApiError::not_found("Location", id))
    }

    async fn regeocode(&self, address: &str, patch: &mut LocationPatch) {
        let Some(geocoder) = &self.enrichment.geocoder else {
            return;
        };
        match geocoder.geocode(address).await {
            Ok(Some(coords)) => {
                patch.lat = Some(coords.lat);
                patch.lng = Some(coords.lng);
                if patch.country_code.is_none() {
                    patch.country_code = coords.country_code;
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!("Failed to geocode updated address '{}': {:#}", address, err);
                record_enrichment_failure("geocode");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{GeocodeResult, Geocoder};
    use crate::location_store::{LocationEntry, SqliteLocationStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<GeocodeResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(GeocodeResult {
                lat: -12.1,
                lng: -77.0,
                country_code: Some("PE".to_string()),
            }))
        }
    }

    fn service_with(geocoder: Option<Arc<CountingGeocoder>>) -> (MapsService, Arc<SqliteLocationStore>) {
        let store = Arc::new(SqliteLocationStore::in_memory().unwrap());
        let enrichment = MapsEnrichment {
            geocoder: geocoder.map(|g| g as Arc<dyn Geocoder>),
            ..Default::default()
        };
        (MapsService::new(store.clone(), enrichment), store)
    }

    fn add_request(name: &str, address: &str) -> AddMapsRequest {
        AddMapsRequest {
            name: Some(name.to_string()),
            address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_requires_name_and_address() {
        let (service, _) = service_with(None);
        let err = service
            .add(AddMapsRequest {
                name: Some("  ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match err {
            ApiError::Validation { errors, .. } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "address"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_falls_back_to_attractions_and_applies_payload() {
        let (service, _) = service_with(Some(Arc::new(CountingGeocoder::default())));
        let location = service
            .add(AddMapsRequest {
                category: Some("shopping".to_string()),
                title: Some(" Larcomar ".to_string()),
                country_code: Some("XX".to_string()),
                location_key: Some("peru|lima|miraflores".to_string()),
                ..add_request(" Larcomar ", "Malecón de la Reserva 610")
            })
            .await
            .unwrap();

        assert!(location.id > 0);
        assert_eq!(location.entry.name, "Larcomar");
        assert_eq!(location.entry.title.as_deref(), Some("Larcomar"));
        assert_eq!(location.entry.category, LocationCategory::Attractions);
        assert_eq!(location.entry.lat, Some(-12.1));
        // Payload wins over geocoding
        assert_eq!(location.entry.country_code.as_deref(), Some("XX"));
        assert_eq!(
            location.entry.location_key.map(|k| k.to_string()).as_deref(),
            Some("peru|lima|miraflores")
        );
    }

    #[tokio::test]
    async fn test_add_rejects_bad_key_and_dining_type() {
        let (service, _) = service_with(None);
        let err = service
            .add(AddMapsRequest {
                dining_type: Some("fine-dining".to_string()),
                location_key: Some("a|b|c|d".to_string()),
                ..add_request("x", "y")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref errors, .. } if errors.len() == 2));
    }

    #[tokio::test]
    async fn test_update_validates_fields() {
        let (service, _) = service_with(None);
        let err = service
            .update(UpdateMapsRequest {
                id: Some(1),
                title: Some("T".to_string()),
                country_code: Some("PER".to_string()),
                website: Some("ftp://example.com".to_string()),
                category: Some("shopping".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match err {
            ApiError::Validation { errors, .. } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["category", "countryCode", "website"]);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = service.update(UpdateMapsRequest::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref errors, .. } if errors.len() == 2));
    }

    #[tokio::test]
    async fn test_update_only_edits_maps_rows() {
        let (service, store) = service_with(None);
        let child = store
            .save(&LocationEntry {
                name: "Upload 1".to_string(),
                address: "Direct Upload".to_string(),
                location_type: LocationType::Upload,
                ..Default::default()
            })
            .unwrap();

        for id in [child, 999] {
            let err = service
                .update(UpdateMapsRequest {
                    id: Some(id),
                    title: Some("T".to_string()),
                    ..Default::default()
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_update_rejects_name_and_address_of_another_location() {
        let (service, store) = service_with(None);
        service.add(add_request("Central", "Av. Pedro de Osma 301")).await.unwrap();
        let other = service.add(add_request("Maido", "Calle San Martín 399")).await.unwrap();

        let err = service
            .update(UpdateMapsRequest {
                id: Some(other.id),
                title: Some("Maido".to_string()),
                name: Some("Central".to_string()),
                address: Some("Av. Pedro de Osma 301".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match err {
            ApiError::Validation { errors, .. } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "address"]);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let unchanged = store.get_by_id(other.id).unwrap().unwrap();
        assert_eq!(unchanged.entry.name, "Maido");
        assert_eq!(store.get_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_regenerates_url_and_regeocodes_changed_address() {
        let geocoder = Arc::new(CountingGeocoder::default());
        let (service, _) = service_with(Some(geocoder.clone()));
        let created = service
            .add(AddMapsRequest {
                location_key: Some("peru|lima".to_string()),
                ..add_request("Central", "Av. Pedro de Osma 301")
            })
            .await
            .unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        // Same address: no new lookup
        service
            .update(UpdateMapsRequest {
                id: Some(created.id),
                title: Some("Central".to_string()),
                name: Some("Central".to_string()),
                address: Some("Av. Pedro de Osma 301".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        let updated = service
            .update(UpdateMapsRequest {
                id: Some(created.id),
                title: Some("Central Restaurante".to_string()),
                name: Some("Central Restaurante".to_string()),
                address: Some("Jr. Dos de Mayo 253".to_string()),
                category: Some("dining".to_string()),
                location_key: Some(None),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(updated.entry.name, "Central Restaurante");
        assert_eq!(updated.entry.category, LocationCategory::Dining);
        assert_eq!(updated.entry.url, maps_url("Central Restaurante", "Jr. Dos de Mayo 253"));
        assert_eq!(updated.entry.location_key, None);
        assert_eq!(updated.entry.title.as_deref(), Some("Central Restaurante"));
    }

    #[test]
    fn test_update_request_distinguishes_null_key() {
        let absent: UpdateMapsRequest = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(absent.location_key, None);
        let cleared: UpdateMapsRequest =
            serde_json::from_str(r#"{"id": 1, "locationKey": null}"#).unwrap();
        assert_eq!(cleared.location_key, Some(None));
        let set: UpdateMapsRequest =
            serde_json::from_str(r#"{"id": 1, "locationKey": "peru", "dining_type": "cafe"}"#)
                .unwrap();
        assert_eq!(set.location_key, Some(Some("peru".to_string())));
        assert_eq!(set.dining_type.as_deref(), Some("cafe"));
    }
}
