use super::envelope::success;
use super::state::{OptionalFolderOpener, ServerState};
use super::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::folder_opener::resolve_folder;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenFolderParams {
    folder_path: Option<String>,
}

fn open_folder(
    opener: &OptionalFolderOpener,
    config: &ServerConfig,
    params: OpenFolderParams,
) -> ApiResult<impl IntoResponse> {
    let opener = opener
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Folder opener".to_string()))?;
    let folder = resolve_folder(
        &config.working_dir,
        params.folder_path.as_deref().unwrap_or_default(),
    )?;
    opener.open(&folder)?;
    Ok(success(json!({ "path": folder.display().to_string() })))
}

async fn get_open_folder(
    State(opener): State<OptionalFolderOpener>,
    State(config): State<ServerConfig>,
    Query(params): Query<OpenFolderParams>,
) -> ApiResult<impl IntoResponse> {
    open_folder(&opener, &config, params)
}

async fn post_open_folder(
    State(opener): State<OptionalFolderOpener>,
    State(config): State<ServerConfig>,
    payload: Result<Json<OpenFolderParams>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(params) = payload?;
    open_folder(&opener, &config, params)
}

pub fn make_files_routes() -> Router<ServerState> {
    Router::new().route("/api/open-folder", get(get_open_folder).post(post_open_folder))
}
