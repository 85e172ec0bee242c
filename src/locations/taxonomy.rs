//! Queries over the country > city > neighborhood hierarchy.

use crate::error::{ApiError, ApiResult};
use crate::location_store::TaxonomyStore;
use crate::taxonomy::data::COUNTRIES;
use crate::taxonomy::{cities_of, countries, generate_combinations, neighborhoods_of, LocationTaxonomy};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Replaces the taxonomy table with the built-in dataset.
pub fn seed_taxonomy(store: &dyn TaxonomyStore) -> Result<Vec<LocationTaxonomy>> {
    let entries = generate_combinations(COUNTRIES);
    let written = store.replace_taxonomy(&entries)?;
    info!("Seeded {} taxonomy entries", written);
    Ok(entries)
}

/// Seeds only when the table is empty. Returns the number of entries written.
pub fn seed_taxonomy_if_empty(store: &dyn TaxonomyStore) -> Result<usize> {
    if store.count_taxonomy()? > 0 {
        return Ok(0);
    }
    Ok(seed_taxonomy(store)?.len())
}

#[derive(Clone)]
pub struct TaxonomyService {
    store: Arc<dyn TaxonomyStore>,
}

impl TaxonomyService {
    pub fn new(store: Arc<dyn TaxonomyStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> ApiResult<Vec<LocationTaxonomy>> {
        Ok(self.store.get_all_taxonomy()?)
    }

    pub fn countries(&self) -> ApiResult<Vec<LocationTaxonomy>> {
        Ok(countries(&self.store.get_all_taxonomy()?))
    }

    pub fn cities(&self, country: &str) -> ApiResult<Vec<LocationTaxonomy>> {
        Ok(cities_of(&self.store.get_all_taxonomy()?, country))
    }

    pub fn neighborhoods(&self, country: &str, city: &str) -> ApiResult<Vec<LocationTaxonomy>> {
        Ok(neighborhoods_of(&self.store.get_all_taxonomy()?, country, city))
    }

    pub fn search(&self, query: Option<&str>) -> ApiResult<Vec<LocationTaxonomy>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty()).ok_or_else(|| {
            ApiError::BadRequest("Search query parameter 'q' is required".to_string())
        })?;
        Ok(self.store.search_taxonomy(query)?)
    }
}
