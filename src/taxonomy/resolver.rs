use super::data::CountryData;
use super::key::LocationKey;
use serde::Serialize;

/// One flattened entry of the taxonomy: a country, a city, or a neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationTaxonomy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub country: String,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    #[serde(rename = "locationKey")]
    pub location_key: LocationKey,
}

impl LocationTaxonomy {
    pub fn new(location_key: LocationKey) -> Self {
        Self {
            id: None,
            country: location_key.country_segment().to_string(),
            city: location_key.city_segment().map(str::to_string),
            neighborhood: location_key.neighborhood_segment().map(str::to_string),
            location_key,
        }
    }

    pub fn depth(&self) -> usize {
        self.location_key.depth()
    }
}

pub fn countries(all: &[LocationTaxonomy]) -> Vec<LocationTaxonomy> {
    all.iter().filter(|t| t.depth() == 1).cloned().collect()
}

pub fn cities_of(all: &[LocationTaxonomy], country: &str) -> Vec<LocationTaxonomy> {
    all.iter()
        .filter(|t| t.depth() == 2 && t.country == country)
        .cloned()
        .collect()
}

pub fn neighborhoods_of(all: &[LocationTaxonomy], country: &str, city: &str) -> Vec<LocationTaxonomy> {
    all.iter()
        .filter(|t| t.depth() == 3 && t.country == country && t.city.as_deref() == Some(city))
        .cloned()
        .collect()
}

/// Expands the nested dataset into one entry per country, per city and per
/// neighborhood, parents before children.
pub fn generate_combinations(countries: &[CountryData]) -> Vec<LocationTaxonomy> {
    let mut entries = Vec::new();
    for country in countries {
        // Static data uses slug values, which are always valid segments
        let Ok(country_key) = LocationKey::country(country.code) else {
            continue;
        };
        entries.push(LocationTaxonomy::new(country_key));
        for city in country.cities {
            let Ok(city_key) = LocationKey::city(country.code, city.value) else {
                continue;
            };
            entries.push(LocationTaxonomy::new(city_key));
            for neighborhood in city.neighborhoods {
                if let Ok(key) = LocationKey::neighborhood(country.code, city.value, neighborhood.value) {
                    entries.push(LocationTaxonomy::new(key));
                }
            }
        }
    }
    entries
}

/// `el-poblado` becomes `El Poblado`.
pub fn format_location_name(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `colombia|bogota|chapinero` becomes `Colombia > Bogota > Chapinero`.
pub fn format_for_display(key: &LocationKey) -> String {
    key.segments()
        .into_iter()
        .map(format_location_name)
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Turns free text such as "Bogotá D.C." into a key segment ("bogot-d-c").
/// Returns `None` when nothing usable is left.
pub fn slugify_segment(value: &str) -> Option<String> {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Case-insensitive substring match on the encoded key.
pub fn search<'a>(all: &'a [LocationTaxonomy], query: &str) -> Vec<&'a LocationTaxonomy> {
    let needle = query.to_lowercase();
    all.iter()
        .filter(|t| t.location_key.to_string().to_lowercase().contains(&needle))
        .collect()
}
