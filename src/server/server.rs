use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

use super::envelope::success;
use super::files_routes::make_files_routes;
use super::location_routes::make_location_routes;
use super::metrics::metrics_handler;
use super::taxonomy_routes::make_taxonomy_routes;
use super::{log_requests, state::*, RequestsLoggingLevel};
use crate::media::PUBLIC_IMAGES_PREFIX;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    success(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

pub fn make_app(state: ServerState) -> Router {
    let config = state.config.clone();
    let images_service = ServeDir::new(&config.images_dir);

    Router::new()
        .route("/api/health", get(health))
        .merge(make_location_routes())
        .merge(make_taxonomy_routes())
        .merge(make_files_routes())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .nest_service(&format!("/{}", PUBLIC_IMAGES_PREFIX), images_service)
        .layer(middleware::from_fn_with_state(
            config.requests_logging_level.clone(),
            log_requests,
        ))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let app = make_app(state);

    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()) => {
            result.context("HTTP server failed")
        }
        result = axum::serve(metrics_listener, make_metrics_app()) => {
            result.context("Metrics server failed")
        }
    }
}
