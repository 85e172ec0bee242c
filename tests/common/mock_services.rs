//! Stand-ins for Google Maps, BigDataCloud, RapidAPI and the Instagram CDN,
//! served from one local axum app.

use super::constants::*;
use super::fixtures::png_bytes;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;

pub struct MockServices {
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

async fn geocode(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("address").is_some_and(|a| a.contains("Nowhere")) {
        return Json(json!({ "status": "ZERO_RESULTS", "results": [] }));
    }
    Json(json!({
        "status": "OK",
        "results": [{
            "geometry": { "location": { "lat": MOCK_LAT, "lng": MOCK_LNG } },
            "address_components": [
                { "long_name": "Colombia", "short_name": MOCK_COUNTRY_CODE, "types": ["country", "political"] }
            ]
        }]
    }))
}

async fn text_search() -> Json<Value> {
    Json(json!({ "status": "OK", "results": [{ "place_id": "place-1" }] }))
}

async fn place_details() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "result": {
            "formatted_address": "Cra. 6 #15-88, La Candelaria, Bogotá, Colombia",
            "website": "https://www.banrepcultural.org/bogota/museo-del-oro",
            "international_phone_number": "+57 601 3432222"
        }
    }))
}

async fn reverse_geocode() -> Json<Value> {
    Json(json!({
        "countryName": "Colombia",
        "countryCode": "CO",
        "city": "Bogota",
        "locality": "La Candelaria"
    }))
}

async fn cdn_image(Path(name): Path<String>) -> impl IntoResponse {
    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    png_bytes(8, 8).into_response()
}

pub fn carousel_response(base_url: &str) -> Value {
    let items: Vec<Value> = (0..MOCK_CAROUSEL_SIZE)
        .map(|i| {
            json!({
                "image_versions2": {
                    "candidates": [
                        { "url": format!("{}/cdn/{}.jpg", base_url, i) },
                        { "url": format!("{}/cdn/{}-small.jpg", base_url, i) }
                    ]
                }
            })
        })
        .collect();
    json!({ "media": { "carousel_media": items } })
}

impl MockServices {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock services");
        let base_url = format!(
            "http://127.0.0.1:{}",
            listener.local_addr().expect("No local address").port()
        );

        let carousel = carousel_response(&base_url);
        let router = Router::new()
            .route("/maps/api/geocode/json", get(geocode))
            .route("/maps/api/place/textsearch/json", get(text_search))
            .route("/maps/api/place/details/json", get(place_details))
            .route("/data/reverse-geocode-client", get(reverse_geocode))
            .route(
                "/api/instagram/links",
                post(move || {
                    let carousel = carousel.clone();
                    async move { Json(carousel) }
                }),
            )
            .route("/cdn/{name}", get(cdn_image));

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock services failed");
        });

        Self {
            base_url,
            _shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for MockServices {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
