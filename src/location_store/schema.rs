//! SQLite schema definitions for the location database.
//!
//! The database holds the `location` table (maps places plus their Instagram and
//! upload children) and the `location_taxonomy` reference table.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};
use anyhow::Result;
use rusqlite::{params, Connection};
use tracing::warn;

const PARENT_LOCATION_FK: ForeignKey = ForeignKey {
    foreign_table: "location",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Version 1 - Locations and taxonomy
// =============================================================================

const LOCATION_TABLE_V1: Table = Table {
    name: "location",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("embed_code", &SqlType::Text),
        sqlite_column!("instagram", &SqlType::Text),
        sqlite_column!(
            "images",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "original_image_urls",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_LOCATION_FK)
        ),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'maps'")
        ),
        sqlite_column!(
            "category",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'attractions'")
        ),
        sqlite_column!("dining_type", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
    ],
    indices: &[
        ("idx_location_parent_id", "parent_id"),
        ("idx_location_category", "category"),
    ],
    unique_constraints: &[&["name", "address"]],
};

const LOCATION_TAXONOMY_TABLE_V1: Table = Table {
    name: "location_taxonomy",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("country", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text),
        sqlite_column!("neighborhood", &SqlType::Text),
        sqlite_column!("location_key", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
    ],
    indices: &[("idx_location_taxonomy_country", "country")],
    unique_constraints: &[&["location_key"]],
};

// =============================================================================
// Version 2 - Contact details and location key
// =============================================================================

const LOCATION_TABLE_V2: Table = Table {
    name: "location",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("embed_code", &SqlType::Text),
        sqlite_column!("instagram", &SqlType::Text),
        sqlite_column!(
            "images",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "original_image_urls",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_LOCATION_FK)
        ),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'maps'")
        ),
        sqlite_column!(
            "category",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'attractions'")
        ),
        sqlite_column!("dining_type", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
        sqlite_column!("contact_address", &SqlType::Text),
        sqlite_column!("country_code", &SqlType::Text),
        sqlite_column!("phone_number", &SqlType::Text),
        sqlite_column!("website", &SqlType::Text),
        sqlite_column!("location_key", &SqlType::Text),
    ],
    indices: &[
        ("idx_location_parent_id", "parent_id"),
        ("idx_location_category", "category"),
        ("idx_location_location_key", "location_key"),
    ],
    unique_constraints: &[&["name", "address"]],
};

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    for column in [
        "contact_address",
        "country_code",
        "phone_number",
        "website",
        "location_key",
    ] {
        LOCATION_TABLE_V2.add_column(conn, column)?;
    }
    LOCATION_TABLE_V2.create_index(conn, "idx_location_location_key")?;
    Ok(())
}

// =============================================================================
// Version 3 - Upload image sets (legacy array shape)
// =============================================================================

const LOCATION_TABLE_V3: Table = Table {
    name: "location",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("embed_code", &SqlType::Text),
        sqlite_column!("instagram", &SqlType::Text),
        sqlite_column!(
            "images",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "original_image_urls",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_LOCATION_FK)
        ),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'maps'")
        ),
        sqlite_column!(
            "category",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'attractions'")
        ),
        sqlite_column!("dining_type", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
        sqlite_column!("contact_address", &SqlType::Text),
        sqlite_column!("country_code", &SqlType::Text),
        sqlite_column!("phone_number", &SqlType::Text),
        sqlite_column!("website", &SqlType::Text),
        sqlite_column!("location_key", &SqlType::Text),
        sqlite_column!("image_sets", &SqlType::Text),
    ],
    indices: &[
        ("idx_location_parent_id", "parent_id"),
        ("idx_location_category", "category"),
        ("idx_location_location_key", "location_key"),
    ],
    unique_constraints: &[&["name", "address"]],
};

fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
    LOCATION_TABLE_V3.add_column(conn, "image_sets")?;
    Ok(())
}

// =============================================================================
// Version 4 - One image set per upload
// =============================================================================

const LOCATION_TABLE_V4: Table = Table {
    name: "location",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("embed_code", &SqlType::Text),
        sqlite_column!("instagram", &SqlType::Text),
        sqlite_column!(
            "images",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "original_image_urls",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_LOCATION_FK)
        ),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'maps'")
        ),
        sqlite_column!(
            "category",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'attractions'")
        ),
        sqlite_column!("dining_type", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
        sqlite_column!("contact_address", &SqlType::Text),
        sqlite_column!("country_code", &SqlType::Text),
        sqlite_column!("phone_number", &SqlType::Text),
        sqlite_column!("website", &SqlType::Text),
        sqlite_column!("location_key", &SqlType::Text),
        sqlite_column!("image_set", &SqlType::Text),
    ],
    indices: &[
        ("idx_location_parent_id", "parent_id"),
        ("idx_location_category", "category"),
        ("idx_location_location_key", "location_key"),
    ],
    unique_constraints: &[&["name", "address"]],
};

/// Collapses a legacy `image_sets` JSON array to a single object. Returns `None` when
/// nothing usable is stored.
pub(super) fn collapse_image_sets(location_id: i64, raw: &str) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(err) => {
            warn!(
                "Discarding unreadable image sets of location {}: {}",
                location_id, err
            );
            return None;
        }
    };
    match value {
        serde_json::Value::Array(mut sets) => {
            if sets.len() > 1 {
                warn!(
                    "Location {} has {} image sets, keeping the first one",
                    location_id,
                    sets.len()
                );
            }
            if sets.is_empty() {
                None
            } else {
                Some(sets.swap_remove(0).to_string())
            }
        }
        serde_json::Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

fn migrate_v3_to_v4(conn: &Connection) -> Result<()> {
    LOCATION_TABLE_V4.add_column(conn, "image_set")?;

    let legacy: Vec<(i64, String)> = {
        let mut stmt =
            conn.prepare("SELECT id, image_sets FROM location WHERE image_sets IS NOT NULL")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    for (id, raw) in legacy {
        conn.execute(
            "UPDATE location SET image_set = ?1 WHERE id = ?2",
            params![collapse_image_sets(id, &raw), id],
        )?;
    }

    conn.execute("ALTER TABLE location DROP COLUMN image_sets", [])?;
    Ok(())
}

// =============================================================================
// Version 5 - Draft/complete status
// =============================================================================

const LOCATION_TABLE_V5: Table = Table {
    name: "location",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("embed_code", &SqlType::Text),
        sqlite_column!("instagram", &SqlType::Text),
        sqlite_column!(
            "images",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "original_image_urls",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!("lat", &SqlType::Real),
        sqlite_column!("lng", &SqlType::Real),
        sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_LOCATION_FK)
        ),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'maps'")
        ),
        sqlite_column!(
            "category",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'attractions'")
        ),
        sqlite_column!("dining_type", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("CURRENT_TIMESTAMP")
        ),
        sqlite_column!("contact_address", &SqlType::Text),
        sqlite_column!("country_code", &SqlType::Text),
        sqlite_column!("phone_number", &SqlType::Text),
        sqlite_column!("website", &SqlType::Text),
        sqlite_column!("location_key", &SqlType::Text),
        sqlite_column!("image_set", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'complete'")
        ),
    ],
    indices: &[
        ("idx_location_parent_id", "parent_id"),
        ("idx_location_category", "category"),
        ("idx_location_location_key", "location_key"),
    ],
    unique_constraints: &[&["name", "address"]],
};

/// Existing rows were written by flows that had already finished, so they all
/// become `complete` through the column default.
fn migrate_v4_to_v5(conn: &Connection) -> Result<()> {
    LOCATION_TABLE_V5.add_column(conn, "status")?;
    Ok(())
}

pub const LOCATION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[LOCATION_TABLE_V1, LOCATION_TAXONOMY_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[LOCATION_TABLE_V2, LOCATION_TAXONOMY_TABLE_V1],
        migration: Some(migrate_v1_to_v2),
    },
    VersionedSchema {
        version: 3,
        tables: &[LOCATION_TABLE_V3, LOCATION_TAXONOMY_TABLE_V1],
        migration: Some(migrate_v2_to_v3),
    },
    VersionedSchema {
        version: 4,
        tables: &[LOCATION_TABLE_V4, LOCATION_TAXONOMY_TABLE_V1],
        migration: Some(migrate_v3_to_v4),
    },
    VersionedSchema {
        version: 5,
        tables: &[LOCATION_TABLE_V5, LOCATION_TAXONOMY_TABLE_V1],
        migration: Some(migrate_v4_to_v5),
    },
];
