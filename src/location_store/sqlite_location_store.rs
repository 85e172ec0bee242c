use super::models::{
    DiningType, ImageSet, Location, LocationCategory, LocationEntry, LocationPatch,
    LocationStatus, LocationType,
};
use super::schema::LOCATION_VERSIONED_SCHEMAS;
use super::{LocationStore, TaxonomyStore};
use crate::sqlite_persistence::prepare_versioned_db;
use crate::taxonomy::{LocationKey, LocationTaxonomy};
use anyhow::{Context, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const LOCATION_COLUMNS: &str = "id, name, title, address, url, embed_code, instagram, images, \
     original_image_urls, lat, lng, parent_id, type, category, dining_type, contact_address, \
     country_code, phone_number, website, location_key, image_set, status, created_at";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// Whether `err` comes from a row clashing with a UNIQUE index.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(failure, _))
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub struct SqliteLocationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocationStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open location database at {:?}", path))?;
        info!("Opened location database at {:?}", path);
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        prepare_versioned_db(&mut conn, LOCATION_VERSIONED_SCHEMAS, "location")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn query_locations(
        conn: &Connection,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<Location>> {
        let mut stmt = conn.prepare(sql)?;
        let locations = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_location)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    fn json_list(raw: Option<String>) -> Vec<String> {
        raw.and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn row_to_location(row: &rusqlite::Row) -> rusqlite::Result<Location> {
        let location_type: String = row.get(12)?;
        let category: String = row.get(13)?;
        let dining_type: Option<String> = row.get(14)?;
        let location_key: Option<String> = row.get(19)?;
        let image_set: Option<String> = row.get(20)?;
        let status: String = row.get(21)?;

        let location_type = LocationType::parse(&location_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                Type::Text,
                format!("unknown location type '{}'", location_type).into(),
            )
        })?;

        Ok(Location {
            id: row.get(0)?,
            entry: LocationEntry {
                name: row.get(1)?,
                title: row.get(2)?,
                address: row.get(3)?,
                url: row.get(4)?,
                embed_code: row.get(5)?,
                instagram: row.get(6)?,
                images: Self::json_list(row.get(7)?),
                original_image_urls: Self::json_list(row.get(8)?),
                lat: row.get(9)?,
                lng: row.get(10)?,
                parent_id: row.get(11)?,
                location_type,
                category: LocationCategory::parse(&category).unwrap_or_default(),
                dining_type: dining_type.as_deref().and_then(DiningType::parse),
                contact_address: row.get(15)?,
                country_code: row.get(16)?,
                phone_number: row.get(17)?,
                website: row.get(18)?,
                location_key: location_key.as_deref().and_then(LocationKey::parse),
                image_set: image_set.and_then(|s| serde_json::from_str::<ImageSet>(&s).ok()),
                status: LocationStatus::parse(&status).unwrap_or_default(),
            },
            created_at: row.get(22)?,
        })
    }

    fn row_to_taxonomy(row: &rusqlite::Row) -> rusqlite::Result<LocationTaxonomy> {
        let raw_key: String = row.get(4)?;
        let location_key = raw_key.parse::<LocationKey>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
        })?;
        Ok(LocationTaxonomy {
            id: Some(row.get(0)?),
            country: row.get(1)?,
            city: row.get(2)?,
            neighborhood: row.get(3)?,
            location_key,
        })
    }

    fn patch_assignments(patch: &LocationPatch) -> Vec<(&'static str, Value)> {
        fn text(value: &Option<String>) -> Option<Value> {
            value.as_ref().map(|v| Value::Text(v.clone()))
        }

        let assignments: Vec<(&'static str, Option<Value>)> = vec![
            ("name", text(&patch.name)),
            ("title", text(&patch.title)),
            ("address", text(&patch.address)),
            ("url", text(&patch.url)),
            ("lat", patch.lat.map(Value::Real)),
            ("lng", patch.lng.map(Value::Real)),
            (
                "category",
                patch.category.map(|c| Value::Text(c.as_str().to_string())),
            ),
            (
                "dining_type",
                patch.dining_type.map(|d| Value::Text(d.as_str().to_string())),
            ),
            ("contact_address", text(&patch.contact_address)),
            ("country_code", text(&patch.country_code)),
            ("phone_number", text(&patch.phone_number)),
            ("website", text(&patch.website)),
            (
                "location_key",
                patch.location_key.as_ref().map(|key| match key {
                    Some(key) => Value::Text(key.to_string()),
                    None => Value::Null,
                }),
            ),
        ];

        assignments
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .collect()
    }
}

impl LocationStore for SqliteLocationStore {
    fn save(&self, entry: &LocationEntry) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let images = serde_json::to_string(&entry.images)?;
        let original_image_urls = serde_json::to_string(&entry.original_image_urls)?;
        let image_set = entry
            .image_set
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let id: i64 = conn
            .query_row(
                "INSERT INTO location (name, title, address, url, embed_code, instagram, images,
                    original_image_urls, lat, lng, parent_id, type, category, dining_type,
                    contact_address, country_code, phone_number, website, location_key,
                    image_set, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20, ?21)
                 ON CONFLICT(name, address) DO UPDATE SET
                    title = excluded.title,
                    url = excluded.url,
                    embed_code = excluded.embed_code,
                    instagram = excluded.instagram,
                    images = excluded.images,
                    original_image_urls = excluded.original_image_urls,
                    lat = excluded.lat,
                    lng = excluded.lng,
                    parent_id = excluded.parent_id,
                    type = excluded.type,
                    category = excluded.category,
                    dining_type = excluded.dining_type,
                    contact_address = excluded.contact_address,
                    country_code = excluded.country_code,
                    phone_number = excluded.phone_number,
                    website = excluded.website,
                    location_key = excluded.location_key,
                    image_set = excluded.image_set,
                    status = excluded.status,
                    created_at = CURRENT_TIMESTAMP
                 RETURNING id",
                params![
                    entry.name,
                    entry.title,
                    entry.address,
                    entry.url,
                    entry.embed_code,
                    entry.instagram,
                    images,
                    original_image_urls,
                    entry.lat,
                    entry.lng,
                    entry.parent_id,
                    entry.location_type.as_str(),
                    entry.category.as_str(),
                    entry.dining_type.map(|d| d.as_str()),
                    entry.contact_address,
                    entry.country_code,
                    entry.phone_number,
                    entry.website,
                    entry.location_key.as_ref().map(|k| k.to_string()),
                    image_set,
                    entry.status.as_str(),
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to save location '{}'", entry.name))?;

        debug!("Saved location '{}' as id {}", entry.name, id);
        Ok(id)
    }

    fn update_by_id(&self, id: i64, patch: &LocationPatch) -> Result<bool> {
        let assignments = Self::patch_assignments(patch);
        if assignments.is_empty() {
            return Ok(false);
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE location SET {} WHERE id = ? AND type = ?",
            set_clause
        );
        let mut values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Integer(id));
        values.push(Value::Text(LocationType::Maps.as_str().to_string()));

        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(&sql, params_from_iter(values.iter()))
            .with_context(|| format!("Failed to update location {}", id))?;
        Ok(updated > 0)
    }

    fn get_all(&self) -> Result<Vec<Location>> {
        let conn = self.conn.lock().unwrap();
        Self::query_locations(
            &conn,
            &format!("SELECT {} FROM location {}", LOCATION_COLUMNS, NEWEST_FIRST),
            &[],
        )
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        let conn = self.conn.lock().unwrap();
        let location = conn
            .query_row(
                &format!("SELECT {} FROM location WHERE id = ?1", LOCATION_COLUMNS),
                params![id],
                Self::row_to_location,
            )
            .optional()?;
        Ok(location)
    }

    fn get_by_parent_id(&self, parent_id: i64) -> Result<Vec<Location>> {
        let conn = self.conn.lock().unwrap();
        Self::query_locations(
            &conn,
            &format!(
                "SELECT {} FROM location WHERE parent_id = ? {}",
                LOCATION_COLUMNS, NEWEST_FIRST
            ),
            &[Value::Integer(parent_id)],
        )
    }

    fn get_by_category(&self, category: LocationCategory) -> Result<Vec<Location>> {
        let conn = self.conn.lock().unwrap();
        Self::query_locations(
            &conn,
            &format!(
                "SELECT {} FROM location WHERE category = ? {}",
                LOCATION_COLUMNS, NEWEST_FIRST
            ),
            &[Value::Text(category.as_str().to_string())],
        )
    }

    fn get_top_level(&self, category: Option<LocationCategory>) -> Result<Vec<Location>> {
        let conn = self.conn.lock().unwrap();
        match category {
            Some(category) => Self::query_locations(
                &conn,
                &format!(
                    "SELECT {} FROM location WHERE parent_id IS NULL AND category = ? {}",
                    LOCATION_COLUMNS, NEWEST_FIRST
                ),
                &[Value::Text(category.as_str().to_string())],
            ),
            None => Self::query_locations(
                &conn,
                &format!(
                    "SELECT {} FROM location WHERE parent_id IS NULL {}",
                    LOCATION_COLUMNS, NEWEST_FIRST
                ),
                &[],
            ),
        }
    }

    fn get_children_of(
        &self,
        parent_ids: &[i64],
        location_type: LocationType,
    ) -> Result<Vec<Location>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; parent_ids.len()].join(", ");
        let mut values: Vec<Value> = parent_ids.iter().map(|id| Value::Integer(*id)).collect();
        values.push(Value::Text(location_type.as_str().to_string()));

        let conn = self.conn.lock().unwrap();
        Self::query_locations(
            &conn,
            &format!(
                "SELECT {} FROM location WHERE parent_id IN ({}) AND type = ? {}",
                LOCATION_COLUMNS, placeholders, NEWEST_FIRST
            ),
            &values,
        )
    }

    fn count_by_type(&self) -> Result<Vec<(LocationType, usize)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM location GROUP BY type")?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(LocationType::ALL
            .iter()
            .map(|t| {
                let count = counts
                    .iter()
                    .find(|(name, _)| name == t.as_str())
                    .map(|(_, c)| *c as usize)
                    .unwrap_or(0);
                (*t, count)
            })
            .collect())
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        // Cascaded child deletes are not reported by changes(), so count up front
        let deleted: i64 = conn.query_row("SELECT COUNT(*) FROM location", [], |row| row.get(0))?;
        conn.execute("DELETE FROM location", [])
            .context("Failed to delete locations")?;
        let deleted = deleted as usize;
        if let Err(err) = conn.execute("VACUUM", []) {
            warn!("VACUUM after clearing locations failed: {}", err);
        }
        info!("Cleared {} locations", deleted);
        Ok(deleted)
    }
}

impl TaxonomyStore for SqliteLocationStore {
    fn get_all_taxonomy(&self) -> Result<Vec<LocationTaxonomy>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, country, city, neighborhood, location_key
             FROM location_taxonomy ORDER BY location_key",
        )?;
        let entries = stmt
            .query_map([], Self::row_to_taxonomy)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn get_taxonomy_by_key(&self, key: &LocationKey) -> Result<Option<LocationTaxonomy>> {
        let conn = self.conn.lock().unwrap();
        let entry = conn
            .query_row(
                "SELECT id, country, city, neighborhood, location_key
                 FROM location_taxonomy WHERE location_key = ?1",
                params![key.to_string()],
                Self::row_to_taxonomy,
            )
            .optional()?;
        Ok(entry)
    }

    fn search_taxonomy(&self, query: &str) -> Result<Vec<LocationTaxonomy>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, country, city, neighborhood, location_key
             FROM location_taxonomy
             WHERE instr(lower(location_key), lower(?1)) > 0
             ORDER BY location_key",
        )?;
        let entries = stmt
            .query_map(params![query], Self::row_to_taxonomy)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn replace_taxonomy(&self, entries: &[LocationTaxonomy]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM location_taxonomy", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO location_taxonomy (country, city, neighborhood, location_key)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.country,
                    entry.city,
                    entry.neighborhood,
                    entry.location_key.to_string(),
                ])
                .with_context(|| format!("Failed to insert taxonomy entry {}", entry.location_key))?;
            }
        }
        tx.commit()?;
        info!("Stored {} taxonomy entries", entries.len());
        Ok(entries.len())
    }

    fn count_taxonomy(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM location_taxonomy", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn clear_taxonomy(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute("DELETE FROM location_taxonomy", [])?)
    }
}
