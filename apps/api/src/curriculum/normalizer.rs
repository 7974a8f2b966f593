//! Schema Normalizer — turns whatever shape the model produced into canonical records.
//!
//! The model is asked for a JSON list of modules but answers with a bare list, a
//! list wrapped under some key, a single module object, or nothing usable. Shape
//! detection is an explicit `ModuleShape` dispatch; field names are resolved
//! through ordered alias lists. Nothing here fails: unusable input yields an
//! empty result.

use serde_json::{Map, Value};

use crate::curriculum::models::{MarketSkill, Module, Resource, ResourceType};

/// URL substituted when a resource arrives without one.
pub const PLACEHOLDER_URL: &str = "#";

/// Sentinel the curator stage uses for "fill this video in later".
const AUTO_VIDEO_SENTINEL: &str = "AUTO_YOUTUBE";

const MODULE_CONTAINER_KEYS: &[&str] = &["path", "roadmap"];
const MARKET_CONTAINER_KEYS: &[&str] = &["market_analysis", "skills", "trends"];

const MODULE_NAME_KEYS: &[&str] = &["module_name", "title", "name"];
const MODULE_DESCRIPTION_KEYS: &[&str] = &["description", "summary", "overview"];
const MODULE_SKILL_KEYS: &[&str] = &["skills_covered", "skills", "topics"];
const MODULE_RESOURCE_KEYS: &[&str] = &["resources", "materials", "links"];
const MODULE_RATIONALE_KEYS: &[&str] = &["why_needed", "rationale", "reason", "why"];
const MODULE_TIME_KEYS: &[&str] = &["estimated_time", "duration", "time"];

const RESOURCE_TITLE_KEYS: &[&str] = &["title", "name"];
const RESOURCE_URL_KEYS: &[&str] = &["url", "link", "href"];
const RESOURCE_TYPE_KEYS: &[&str] = &["type", "resource_type", "kind"];
const RESOURCE_DURATION_KEYS: &[&str] = &["duration", "length", "estimated_time"];
const RESOURCE_REASON_KEYS: &[&str] = &["reason", "why", "description"];

const MARKET_SKILL_KEYS: &[&str] = &["skill", "name", "skill_name"];
const MARKET_DEMAND_KEYS: &[&str] = &["demand_level", "demand", "level"];
const MARKET_GROWTH_KEYS: &[&str] = &["growth_metric", "growth", "trend"];

// ────────────────────────────────────────────────────────────────────────────
// Shape dispatch
// ────────────────────────────────────────────────────────────────────────────

/// Recognized top-level shapes of a parsed stage output.
#[derive(Debug, PartialEq)]
pub enum ModuleShape<'a> {
    /// A bare list of entries.
    List(&'a [Value]),
    /// A keyed container holding the list under a conventional key.
    Wrapped(&'a [Value]),
    /// A single record that should be treated as a one-element list.
    Single(&'a Map<String, Value>),
    /// The first list-valued entry of a keyed container.
    FirstList(&'a [Value]),
    Unrecognized,
}

impl<'a> ModuleShape<'a> {
    /// Classifies `value`. `container_keys` are the conventional wrapper keys and
    /// `record_keys` the fields that identify a single record.
    pub fn classify(value: &'a Value, container_keys: &[&str], record_keys: &[&str]) -> Self {
        let map = match value {
            Value::Array(items) => return ModuleShape::List(items),
            Value::Object(map) => map,
            _ => return ModuleShape::Unrecognized,
        };

        if let Some(items) = container_keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
        {
            return ModuleShape::Wrapped(items);
        }

        if record_keys.iter().any(|key| map.contains_key(*key)) {
            return ModuleShape::Single(map);
        }

        match map.values().find_map(Value::as_array) {
            Some(items) => ModuleShape::FirstList(items),
            None => ModuleShape::Unrecognized,
        }
    }

    /// The keyed records this shape carries, in order.
    fn records(&self) -> Vec<&'a Map<String, Value>> {
        match *self {
            ModuleShape::List(items) | ModuleShape::Wrapped(items) | ModuleShape::FirstList(items) => {
                items.iter().filter_map(Value::as_object).collect()
            }
            ModuleShape::Single(map) => vec![map],
            ModuleShape::Unrecognized => vec![],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Modules
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes any parsed stage output into modules numbered 1..N.
/// Identifiers carried by the input are ignored.
pub fn normalize(value: &Value) -> Vec<Module> {
    ModuleShape::classify(value, MODULE_CONTAINER_KEYS, MODULE_NAME_KEYS)
        .records()
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_module(index, record))
        .collect()
}

fn normalize_module(index: usize, record: &Map<String, Value>) -> Module {
    let resources: Vec<Resource> = first_present(record, MODULE_RESOURCE_KEYS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(normalize_resource)
                .collect()
        })
        .unwrap_or_default();

    Module {
        id: index as u32 + 1,
        module_name: string_field(record, MODULE_NAME_KEYS)
            .unwrap_or_else(|| format!("Module {}", index + 1)),
        description: string_field(record, MODULE_DESCRIPTION_KEYS).unwrap_or_default(),
        skills_covered: first_present(record, MODULE_SKILL_KEYS)
            .map(string_list)
            .unwrap_or_default(),
        resources,
        why_needed: string_field(record, MODULE_RATIONALE_KEYS).unwrap_or_default(),
        estimated_time: string_field(record, MODULE_TIME_KEYS)
            .unwrap_or_else(|| "Self-paced".to_string()),
    }
}

fn normalize_resource(record: &Map<String, Value>) -> Resource {
    let url = string_field(record, RESOURCE_URL_KEYS)
        .filter(|url| !url.eq_ignore_ascii_case(AUTO_VIDEO_SENTINEL))
        .unwrap_or_else(|| PLACEHOLDER_URL.to_string());

    Resource {
        title: string_field(record, RESOURCE_TITLE_KEYS)
            .unwrap_or_else(|| "Untitled Resource".to_string()),
        url,
        resource_type: canonical_resource_type(string_field(record, RESOURCE_TYPE_KEYS).as_deref()),
        duration: string_field(record, RESOURCE_DURATION_KEYS)
            .unwrap_or_else(|| "Varies".to_string()),
        reason: string_field(record, RESOURCE_REASON_KEYS).unwrap_or_default(),
    }
}

/// Maps a free-form type label onto the four canonical resource types.
/// Case-insensitive keyword match in priority order; unknown or absent → Article.
pub fn canonical_resource_type(raw: Option<&str>) -> ResourceType {
    let Some(raw) = raw else {
        return ResourceType::Article;
    };
    let label = raw.to_lowercase();

    if label.contains("video") {
        ResourceType::Video
    } else if label.contains("course") {
        ResourceType::Course
    } else if label.contains("doc") {
        ResourceType::Documentation
    } else {
        // "article", "blog", "post" and everything unrecognized
        ResourceType::Article
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Market analysis
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes the market analysis stage output. Entries without a skill name are dropped.
pub fn normalize_market(value: &Value) -> Vec<MarketSkill> {
    ModuleShape::classify(value, MARKET_CONTAINER_KEYS, MARKET_SKILL_KEYS)
        .records()
        .into_iter()
        .filter_map(|record| {
            Some(MarketSkill {
                skill: string_field(record, MARKET_SKILL_KEYS)?,
                demand_level: string_field(record, MARKET_DEMAND_KEYS)
                    .unwrap_or_else(|| "High".to_string()),
                growth_metric: string_field(record, MARKET_GROWTH_KEYS)
                    .unwrap_or_else(|| "N/A".to_string()),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Field helpers
// ────────────────────────────────────────────────────────────────────────────

/// First alias whose value is present and not null.
fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// First alias that renders to a non-blank string. Numbers and booleans are
/// rendered; arrays and objects are skipped.
fn string_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .filter_map(scalar_to_string)
        .find(|s| !s.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A list value becomes its scalar members; a lone scalar becomes a one-element list.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        other => scalar_to_string(other)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
    }
}
