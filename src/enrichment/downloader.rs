use super::{build_http_client, ImageDownloader};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Fetches remote images (Instagram CDN URLs) onto local disk.
pub struct HttpImageDownloader {
    client: reqwest::Client,
}

impl HttpImageDownloader {
    pub fn new(timeout_sec: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_sec)?,
        })
    }
}

#[async_trait]
impl ImageDownloader for HttpImageDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Download of {} failed with status {}", url, response.status());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create parent directories")?;
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create {:?}", dest))?;
        file.write_all(&bytes)
            .await
            .context("Failed to write image")?;
        file.flush().await.context("Failed to flush image")?;

        Ok(bytes.len() as u64)
    }
}
