//! Read side: locations composed with their Instagram embeds and uploads.

use crate::location_store::{Location, LocationCategory, LocationStore, LocationType};
use crate::taxonomy::is_in_scope;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationWithChildren {
    #[serde(flatten)]
    pub location: Location,
    pub instagram_embeds: Vec<Location>,
    pub uploads: Vec<Location>,
}

fn group_by_parent(children: Vec<Location>) -> HashMap<i64, Vec<Location>> {
    let mut grouped: HashMap<i64, Vec<Location>> = HashMap::new();
    for child in children {
        if let Some(parent_id) = child.entry.parent_id {
            grouped.entry(parent_id).or_default().push(child);
        }
    }
    grouped
}

/// Top-level locations with their children attached, using one query for the parents
/// and one per child type.
///
/// `scope` is an encoded location key; only locations whose key equals it or lies
/// beneath it are returned.
pub fn list_locations(
    store: &dyn LocationStore,
    category: Option<LocationCategory>,
    scope: Option<&str>,
) -> Result<Vec<LocationWithChildren>> {
    let mut parents = store.get_top_level(category)?;
    if let Some(scope) = scope {
        parents.retain(|location| {
            location
                .entry
                .location_key
                .as_ref()
                .is_some_and(|key| is_in_scope(&key.to_string(), scope))
        });
    }

    let ids: Vec<i64> = parents.iter().map(|p| p.id).collect();
    let mut embeds = group_by_parent(store.get_children_of(&ids, LocationType::Instagram)?);
    let mut uploads = group_by_parent(store.get_children_of(&ids, LocationType::Upload)?);

    Ok(parents
        .into_iter()
        .map(|location| LocationWithChildren {
            instagram_embeds: embeds.remove(&location.id).unwrap_or_default(),
            uploads: uploads.remove(&location.id).unwrap_or_default(),
            location,
        })
        .collect())
}

/// A single location with its children, `None` when the id is unknown.
pub fn get_location_by_id(store: &dyn LocationStore, id: i64) -> Result<Option<LocationWithChildren>> {
    let Some(location) = store.get_by_id(id)? else {
        return Ok(None);
    };
    let children = store.get_by_parent_id(id)?;
    let (instagram_embeds, uploads) = children
        .into_iter()
        .filter(|c| c.entry.location_type != LocationType::Maps)
        .partition(|c| c.entry.location_type == LocationType::Instagram);

    Ok(Some(LocationWithChildren {
        location,
        instagram_embeds,
        uploads,
    }))
}
