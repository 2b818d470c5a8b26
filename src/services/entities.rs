//! Entity snapshot handed to the home-automation side
//!
//! One sensor per latest category plus one "At Daycare" sensor. A snapshot
//! always replaces the previous one in full.

use crate::domain::ChildData;
use serde::Serialize;
use serde_json::{Map, Value};

pub const ENTITY_PREFIX: &str = "HiMama";
pub const AT_DAYCARE_NAME: &str = "At Daycare";

/// One sensor entity: primary state plus side attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntity {
    /// Stable topic-safe id, e.g. `himama_latest_meals`
    pub object_id: String,
    /// Display name, e.g. `HiMama Latest Meals`
    pub name: String,
    pub state: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

/// Lowercase, with runs of anything non-alphanumeric collapsed to `_`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

pub fn build_entities(data: &ChildData) -> Vec<SensorEntity> {
    let mut entities = Vec::with_capacity(data.latest.len() + 1);

    for (key, entry) in &data.latest {
        let name = format!("{} Latest {}", ENTITY_PREFIX, key);
        let mut attributes = Map::new();
        attributes.insert(key.to_lowercase(), serde_json::to_value(&entry.value).unwrap_or(Value::Null));

        entities.push(SensorEntity {
            object_id: slugify(&name),
            name,
            state: Value::String(entry.date.format("%Y-%m-%d").to_string()),
            attributes: Some(attributes),
        });
    }

    let name = format!("{} {}", ENTITY_PREFIX, AT_DAYCARE_NAME);
    entities.push(SensorEntity {
        object_id: slugify(&name),
        name,
        state: data.at_daycare.map(Value::Bool).unwrap_or(Value::Null),
        attributes: None,
    });

    entities
}
