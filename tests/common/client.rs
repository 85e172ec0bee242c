//! HTTP client wrapper for end-to-end tests

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// One part of an upload form.
pub struct FilePart {
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn png(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            field: "files",
            file_name: file_name.to_string(),
            mime: "image/png",
            bytes,
        }
    }

    pub fn as_field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }
}

/// Thin wrapper over reqwest with one method per endpoint. Methods return the raw
/// response so tests can check status codes as well as bodies.
pub struct TestClient {
    client: Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    pub async fn health(&self) -> Response {
        self.get("/api/health").await
    }

    // ========================================================================
    // Locations
    // ========================================================================

    pub async fn list_locations(&self) -> Response {
        self.get("/api/locations").await
    }

    pub async fn list_locations_with(&self, category: Option<&str>, location_key: Option<&str>) -> Response {
        let mut query = Vec::new();
        if let Some(category) = category {
            query.push(("category", category));
        }
        if let Some(location_key) = location_key {
            query.push(("locationKey", location_key));
        }
        self.client
            .get(self.url("/api/locations"))
            .query(&query)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn get_location(&self, id: impl ToString) -> Response {
        self.get(&format!("/api/locations/{}", id.to_string())).await
    }

    pub async fn add_maps(&self, body: &Value) -> Response {
        self.post_json("/api/add-maps", body).await
    }

    pub async fn update_maps(&self, body: &Value) -> Response {
        self.post_json("/api/update-maps", body).await
    }

    pub async fn add_instagram(&self, body: &Value) -> Response {
        self.post_json("/api/add-instagram", body).await
    }

    pub async fn add_upload(
        &self,
        location_id: Option<i64>,
        photographer_credit: Option<&str>,
        files: Vec<FilePart>,
    ) -> Response {
        let mut form = Form::new();
        if let Some(id) = location_id {
            form = form.text("locationId", id.to_string());
        }
        if let Some(credit) = photographer_credit {
            form = form.text("photographerCredit", credit.to_string());
        }
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(file.mime)
                .expect("Invalid mime type");
            form = form.part(file.field, part);
        }
        self.client
            .post(self.url("/api/add-upload"))
            .multipart(form)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn clear_db(&self) -> Response {
        self.get("/api/clear-db").await
    }

    // ========================================================================
    // Taxonomy
    // ========================================================================

    pub async fn taxonomy(&self, path: &str) -> Response {
        self.get(&format!("/api/location-hierarchy{}", path)).await
    }

    pub async fn search_taxonomy(&self, q: &str) -> Response {
        self.client
            .get(self.url("/api/location-hierarchy/search"))
            .query(&[("q", q)])
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub async fn open_folder(&self, folder_path: &str) -> Response {
        self.client
            .get(self.url("/api/open-folder"))
            .query(&[("folderPath", folder_path)])
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn open_folder_post(&self, body: &Value) -> Response {
        self.post_json("/api/open-folder", body).await
    }
}
