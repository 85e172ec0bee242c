//! Routes that create, edit, list and wipe locations.

use super::envelope::success;
use super::state::*;
use super::ServerConfig;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::location_store::{LocationCategory, VariantKind};
use crate::locations::{
    get_location_by_id, list_locations, refresh_location_metrics, AddInstagramRequest,
    AddMapsRequest, UpdateMapsRequest, UploadRequest,
};
use crate::media::UploadedFile;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    category: Option<String>,
    location_key: Option<String>,
}

async fn get_locations(
    State(store): State<GuardedLocationStore>,
    State(config): State<ServerConfig>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            LocationCategory::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid category '{}'", raw)))?,
        ),
    };
    let scope = query
        .location_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let locations = list_locations(store.as_ref(), category, scope)?;
    Ok(success(json!({
        "locations": locations,
        "cwd": config.working_dir.display().to_string(),
    })))
}

async fn get_location(
    State(store): State<GuardedLocationStore>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let parsed = id
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid location id '{}'", id)))?;
    let location =
        get_location_by_id(store.as_ref(), parsed)?.ok_or_else(|| ApiError::not_found("Location", parsed))?;
    Ok(success(location))
}

async fn add_maps(
    State(service): State<GuardedMapsService>,
    payload: Result<Json<AddMapsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let entry = service.add(request).await?;
    Ok(success(json!({ "entry": entry })))
}

async fn update_maps(
    State(service): State<GuardedMapsService>,
    payload: Result<Json<UpdateMapsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let entry = service.update(request).await?;
    Ok(success(json!({ "entry": entry })))
}

async fn add_instagram(
    State(service): State<GuardedInstagramService>,
    payload: Result<Json<AddInstagramRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let entry = service.add(request).await?;
    Ok(success(json!({ "entry": entry })))
}

fn parse_location_id(raw: &str) -> ApiResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiError::validation(vec![FieldError::new(
            "locationId",
            format!("Invalid location id '{}'", raw),
        )])
    })
}

/// Reads the upload form. Files arrive under `files` (or `files[]`), typed variants
/// under their variant name.
async fn read_upload_form(mut multipart: Multipart) -> ApiResult<UploadRequest> {
    let mut request = UploadRequest::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "locationId" | "parentId" => {
                request.location_id = Some(parse_location_id(&field.text().await?)?);
            }
            "photographerCredit" => {
                request.photographer_credit = Some(field.text().await?);
            }
            other => {
                let variant = VariantKind::parse(other);
                if variant.is_none() && other != "files" && other != "files[]" {
                    debug!("Ignoring unknown upload field '{}'", other);
                    continue;
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                request.files.push(UploadedFile {
                    variant,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        }
    }
    Ok(request)
}

async fn add_upload(
    State(service): State<GuardedUploadsService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = read_upload_form(multipart?).await?;
    let entry = service.add(request).await?;
    Ok(success(json!({ "entry": entry })))
}

async fn clear_db(State(store): State<GuardedLocationStore>) -> ApiResult<impl IntoResponse> {
    let deleted = store.clear()?;
    warn!("Database cleared, {} locations deleted", deleted);
    refresh_location_metrics(store.as_ref());
    Ok(success(json!({
        "message": "Database cleared successfully",
        "deleted": deleted,
    })))
}

pub fn make_location_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/locations", get(get_locations))
        .route("/api/locations/{id}", get(get_location))
        .route("/api/add-maps", post(add_maps))
        .route("/api/update-maps", post(update_maps))
        .route("/api/add-instagram", post(add_instagram))
        .route("/api/add-upload", post(add_upload))
        .route("/api/clear-db", get(clear_db))
}
