use crate::taxonomy::LocationKey;
use serde::{Deserialize, Serialize};

// =============================================================================
// Classification
// =============================================================================

/// Which flow produced a location row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Entered manually from a Google Maps place.
    #[default]
    Maps,
    /// Ingested from an Instagram embed, always attached to a parent.
    Instagram,
    /// Created from uploaded photos, always attached to a parent.
    Upload,
}

impl LocationType {
    pub const ALL: [LocationType; 3] = [
        LocationType::Maps,
        LocationType::Instagram,
        LocationType::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Maps => "maps",
            LocationType::Instagram => "instagram",
            LocationType::Upload => "upload",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "maps" => Some(LocationType::Maps),
            "instagram" => Some(LocationType::Instagram),
            "upload" => Some(LocationType::Upload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Dining,
    Accommodations,
    #[default]
    Attractions,
    Nightlife,
}

impl LocationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationCategory::Dining => "dining",
            LocationCategory::Accommodations => "accommodations",
            LocationCategory::Attractions => "attractions",
            LocationCategory::Nightlife => "nightlife",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dining" => Some(LocationCategory::Dining),
            "accommodations" => Some(LocationCategory::Accommodations),
            "attractions" => Some(LocationCategory::Attractions),
            "nightlife" => Some(LocationCategory::Nightlife),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiningType {
    Restaurant,
    FastFood,
    FoodTruck,
    Cafe,
    Bar,
    Pub,
    RooftopBar,
    StreetFood,
    Brewery,
    Winery,
    Seafood,
    Italian,
    American,
    WineBar,
    CocktailBar,
    DiveBar,
    Buffet,
    Bakery,
    Dessert,
    IceCream,
    CoffeeShop,
    TeaShop,
    JuiceBar,
    SmoothieBar,
    Pizza,
}

impl DiningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiningType::Restaurant => "restaurant",
            DiningType::FastFood => "fast-food",
            DiningType::FoodTruck => "food-truck",
            DiningType::Cafe => "cafe",
            DiningType::Bar => "bar",
            DiningType::Pub => "pub",
            DiningType::RooftopBar => "rooftop-bar",
            DiningType::StreetFood => "street-food",
            DiningType::Brewery => "brewery",
            DiningType::Winery => "winery",
            DiningType::Seafood => "seafood",
            DiningType::Italian => "italian",
            DiningType::American => "american",
            DiningType::WineBar => "wine-bar",
            DiningType::CocktailBar => "cocktail-bar",
            DiningType::DiveBar => "dive-bar",
            DiningType::Buffet => "buffet",
            DiningType::Bakery => "bakery",
            DiningType::Dessert => "dessert",
            DiningType::IceCream => "ice-cream",
            DiningType::CoffeeShop => "coffee-shop",
            DiningType::TeaShop => "tea-shop",
            DiningType::JuiceBar => "juice-bar",
            DiningType::SmoothieBar => "smoothie-bar",
            DiningType::Pizza => "pizza",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

/// Lifecycle of a row whose data arrives in stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    /// Persisted, media still being acquired.
    Draft,
    #[default]
    Complete,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Draft => "draft",
            LocationStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(LocationStatus::Draft),
            "complete" => Some(LocationStatus::Complete),
            _ => None,
        }
    }
}

// =============================================================================
// Image sets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Thumbnail,
    Square,
    Wide,
    Portrait,
    Hero,
}

impl VariantKind {
    /// Order in which variants are presented to clients.
    pub const ORDER: [VariantKind; 5] = [
        VariantKind::Thumbnail,
        VariantKind::Square,
        VariantKind::Wide,
        VariantKind::Portrait,
        VariantKind::Hero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Thumbnail => "thumbnail",
            VariantKind::Square => "square",
            VariantKind::Wide => "wide",
            VariantKind::Portrait => "portrait",
            VariantKind::Hero => "hero",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|k| k.as_str() == s)
    }

    fn rank(kind: Option<VariantKind>) -> usize {
        match kind {
            Some(k) => Self::ORDER.iter().position(|o| *o == k).unwrap_or(0),
            None => Self::ORDER.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVariant {
    /// `None` for an untyped original.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<VariantKind>,
    pub path: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub format: String,
}

/// Every stored file of one upload, typed variants first in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub variants: Vec<ImageVariant>,
    #[serde(
        rename = "photographerCredit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photographer_credit: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl ImageSet {
    pub fn new(
        mut variants: Vec<ImageVariant>,
        photographer_credit: Option<String>,
        created_at: String,
    ) -> Self {
        // Stable, so originals keep their upload order
        variants.sort_by_key(|v| VariantKind::rank(v.kind));
        Self {
            variants,
            photographer_credit,
            created_at,
        }
    }

    pub fn variant(&self, kind: VariantKind) -> Option<&ImageVariant> {
        self.variants.iter().find(|v| v.kind == Some(kind))
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Everything about a location except what the database assigns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    pub title: Option<String>,
    pub address: String,
    pub url: String,
    pub embed_code: Option<String>,
    pub instagram: Option<String>,
    pub images: Vec<String>,
    pub original_image_urls: Vec<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub category: LocationCategory,
    pub dining_type: Option<DiningType>,
    #[serde(rename = "contactAddress")]
    pub contact_address: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "locationKey")]
    pub location_key: Option<LocationKey>,
    #[serde(rename = "imageSet", skip_serializing_if = "Option::is_none")]
    pub image_set: Option<ImageSet>,
    pub status: LocationStatus,
}

/// A persisted location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: i64,
    #[serde(flatten)]
    pub entry: LocationEntry,
    pub created_at: String,
}

/// Fields to change on a `maps` row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: Option<LocationCategory>,
    pub dining_type: Option<DiningType>,
    pub contact_address: Option<String>,
    pub country_code: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    /// `Some(None)` clears the key.
    pub location_key: Option<Option<LocationKey>>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        *self == LocationPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_strings() {
        for t in LocationType::ALL {
            assert_eq!(LocationType::parse(t.as_str()), Some(t));
        }
        assert_eq!(LocationCategory::parse("dining"), Some(LocationCategory::Dining));
        assert_eq!(LocationCategory::parse("shopping"), None);
        assert_eq!(DiningType::parse("rooftop-bar"), Some(DiningType::RooftopBar));
        assert_eq!(DiningType::RooftopBar.as_str(), "rooftop-bar");
        assert_eq!(DiningType::parse("fine-dining"), None);
        assert_eq!(LocationStatus::parse("draft"), Some(LocationStatus::Draft));
    }

    #[test]
    fn image_set_orders_variants() {
        let variant = |kind: Option<VariantKind>, path: &str| ImageVariant {
            kind,
            path: path.to_string(),
            width: 1,
            height: 1,
            size: 1,
            format: "jpeg".to_string(),
        };
        let set = ImageSet::new(
            vec![
                variant(None, "original-a.jpg"),
                variant(Some(VariantKind::Hero), "hero.jpg"),
                variant(None, "original-b.jpg"),
                variant(Some(VariantKind::Thumbnail), "thumb.jpg"),
            ],
            Some("Ana".to_string()),
            "2024-01-01T00:00:00Z".to_string(),
        );
        let paths: Vec<&str> = set.variants.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["thumb.jpg", "hero.jpg", "original-a.jpg", "original-b.jpg"]
        );
        assert_eq!(set.variant(VariantKind::Hero).unwrap().path, "hero.jpg");
        assert!(set.variant(VariantKind::Wide).is_none());
    }

    #[test]
    fn location_serializes_with_wire_names() {
        let location = Location {
            id: 7,
            entry: LocationEntry {
                name: "Cafe".to_string(),
                address: "Calle 1".to_string(),
                category: LocationCategory::Dining,
                contact_address: Some("Calle 1, Bogotá".to_string()),
                location_key: LocationKey::parse("colombia|bogota"),
                ..Default::default()
            },
            created_at: "2024-01-01 00:00:00".to_string(),
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["type"], "maps");
        assert_eq!(json["category"], "dining");
        assert_eq!(json["contactAddress"], "Calle 1, Bogotá");
        assert_eq!(json["locationKey"], "colombia|bogota");
        assert_eq!(json["status"], "complete");
        assert!(json.get("imageSet").is_none());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(LocationPatch::default().is_empty());
        let patch = LocationPatch {
            location_key: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
