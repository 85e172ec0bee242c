//! Test fixture creation

use image::{ImageBuffer, ImageFormat, Rgb};
use location_server::location_store::SqliteLocationStore;
use location_server::locations::seed_taxonomy_if_empty;
use reqwest::Response;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

/// Opens (creating if needed) a database at `path` with the taxonomy seeded.
pub fn create_seeded_store(path: &Path) -> anyhow::Result<SqliteLocationStore> {
    let store = SqliteLocationStore::new(path)?;
    seed_taxonomy_if_empty(&store)?;
    Ok(store)
}

/// A solid-color PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    ImageBuffer::from_pixel(width, height, Rgb([30u8, 144, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

pub async fn read_json(response: Response) -> Value {
    response.json().await.expect("Response was not JSON")
}
