//! Read-only routes over the location hierarchy, served under two prefixes.

use super::envelope::success;
use super::state::ServerState;
use crate::error::ApiResult;
use crate::locations::TaxonomyService;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

const PREFIXES: [&str; 2] = ["/api/location-hierarchy", "/api/location-taxonomy"];

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn get_all(State(service): State<TaxonomyService>) -> ApiResult<impl IntoResponse> {
    Ok(success(json!({ "locations": service.all()? })))
}

async fn get_countries(State(service): State<TaxonomyService>) -> ApiResult<impl IntoResponse> {
    Ok(success(json!({ "countries": service.countries()? })))
}

async fn get_cities(
    State(service): State<TaxonomyService>,
    Path(country): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(json!({ "cities": service.cities(&country)? })))
}

async fn get_neighborhoods(
    State(service): State<TaxonomyService>,
    Path((country, city)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(json!({
        "neighborhoods": service.neighborhoods(&country, &city)?
    })))
}

async fn search(
    State(service): State<TaxonomyService>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(json!({
        "locations": service.search(query.q.as_deref())?
    })))
}

pub fn make_taxonomy_routes() -> Router<ServerState> {
    let mut router = Router::new();
    for prefix in PREFIXES {
        router = router
            .route(prefix, get(get_all))
            .route(&format!("{}/countries", prefix), get(get_countries))
            .route(&format!("{}/cities/{{country}}", prefix), get(get_cities))
            .route(
                &format!("{}/neighborhoods/{{country}}/{{city}}", prefix),
                get(get_neighborhoods),
            )
            .route(&format!("{}/search", prefix), get(search));
    }
    router
}
