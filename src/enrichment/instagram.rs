//! Instagram embed parsing and the RapidAPI media lookup.

use super::{build_http_client, InstagramMediaFetcher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_RAPIDAPI_INSTAGRAM_BASE_URL: &str = "https://instagram120.p.rapidapi.com";

lazy_static! {
    static ref PERMALINK_RE: Regex =
        Regex::new(r#"data-instgrm-permalink="([^"]+)""#).expect("valid permalink regex");
    static ref AUTHOR_RE: Regex =
        Regex::new(r"A post shared by ([^<]+)").expect("valid author regex");
    static ref AUTHOR_PREFIX_RE: Regex =
        Regex::new(r"(?i)a post shared by").expect("valid prefix regex");
}

/// What can be read out of pasted embed markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstagramEmbedData {
    /// Post permalink without its query string.
    pub url: Option<String>,
    /// Author line as written in the embed, e.g. `Museo del Oro (@museodeloro)`.
    pub author: Option<String>,
}

pub fn extract_instagram_data(html: &str) -> InstagramEmbedData {
    let url = PERMALINK_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split('?').next().unwrap_or_default().to_string());

    let author = AUTHOR_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|a| !a.is_empty());

    InstagramEmbedData { url, author }
}

/// Turns an author line into a profile URL: `@museodeloro` becomes
/// `https://www.instagram.com/museodeloro/`.
pub fn normalize_instagram(author: Option<&str>) -> Option<String> {
    let author = author?;
    let stripped = AUTHOR_PREFIX_RE.replace_all(author, "");
    let first_token = stripped.split_whitespace().next()?;
    let handle: String = first_token
        .strip_prefix('@')
        .unwrap_or(first_token)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    if handle.is_empty() {
        return None;
    }
    Some(format!("https://www.instagram.com/{}/", handle))
}

fn first_candidate(item: &Value) -> Option<String> {
    item.pointer("/image_versions2/candidates/0/url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Reads image URLs out of the proxy response.
///
/// Carousel posts list one entry per slide, single posts carry the candidates at the top
/// level. Some proxy versions answer with `pictureUrl` entries instead.
pub fn parse_media_response(data: &Value) -> Vec<String> {
    let mut urls = Vec::new();

    if let Some(media) = data.get("media") {
        if let Some(carousel) = media.get("carousel_media").and_then(Value::as_array) {
            urls.extend(carousel.iter().filter_map(first_candidate));
        } else if let Some(url) = first_candidate(media) {
            urls.push(url);
        }
    }

    if urls.is_empty() {
        let picture_url = |item: &Value| {
            item.get("pictureUrl")
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        match data {
            Value::Array(items) => urls.extend(items.iter().filter_map(picture_url)),
            other => urls.extend(picture_url(other)),
        }
    }

    urls
}

pub struct RapidApiInstagramClient {
    client: reqwest::Client,
    base_url: String,
    api_host: String,
    api_key: String,
}

impl RapidApiInstagramClient {
    pub fn new(base_url: String, api_key: String, timeout_sec: u64) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let api_host = reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid RapidAPI base URL {}", base_url))?
            .host_str()
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            client: build_http_client(timeout_sec)?,
            base_url,
            api_host,
            api_key,
        })
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }
}

#[async_trait]
impl InstagramMediaFetcher for RapidApiInstagramClient {
    async fn fetch_media_urls(&self, post_url: &str) -> Result<Vec<String>> {
        let url = format!("{}/api/instagram/links", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-rapidapi-host", &self.api_host)
            .header("x-rapidapi-key", &self.api_key)
            .json(&json!({ "url": post_url }))
            .send()
            .await
            .context("Failed to reach the Instagram API")?;

        if !response.status().is_success() {
            anyhow::bail!("Instagram API returned status {}", response.status());
        }

        let data: Value = response
            .json()
            .await
            .context("Failed to parse Instagram API response")?;
        let urls = parse_media_response(&data);
        debug!("Instagram post {} has {} images", post_url, urls.len());
        Ok(urls)
    }
}
