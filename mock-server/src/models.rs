//! Server-side shapes of the mock service.
//!
//! Defined independently from the client DTOs so integration tests catch
//! schema drift. Nested targeting data (rules, clauses, targets) is kept as
//! raw JSON because the mock stores it without interpreting it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

impl Link {
    pub fn json(href: String) -> Self {
        Self {
            href,
            media_type: "application/json".to_string(),
        }
    }
}

pub type Links = BTreeMap<String, Link>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub name: String,
    pub tags: Vec<String>,
    pub include_in_snippet_by_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<Environment>>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub name: String,
    pub api_key: String,
    pub mobile_key: String,
    pub color: String,
    pub default_ttl: u32,
    pub secure_mode: bool,
    pub default_track_events: bool,
    pub require_comments: bool,
    pub confirm_changes: bool,
    pub tags: Vec<String>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub key: String,
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "_version")]
    pub version: u64,
    pub creation_date: i64,
    pub variations: Vec<Variation>,
    pub temporary: bool,
    pub tags: Vec<String>,
    pub client_side_availability: ClientSideAvailability,
    pub defaults: Defaults,
    pub archived: bool,
    pub deprecated: bool,
    pub environments: BTreeMap<String, FlagEnvironment>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSideAvailability {
    pub using_mobile_key: bool,
    pub using_environment_id: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub on_variation: usize,
    pub off_variation: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlagEnvironment {
    pub on: bool,
    pub archived: bool,
    pub salt: String,
    pub last_modified: i64,
    pub version: u64,
    pub targets: Vec<Value>,
    pub rules: Vec<Value>,
    pub fallthrough: Value,
    pub off_variation: usize,
    pub prerequisites: Vec<Value>,
    pub track_events: bool,
    pub track_events_fallthrough: bool,
    #[serde(rename = "_site")]
    pub site: Link,
    #[serde(rename = "_environmentName")]
    pub environment_name: String,
}

impl FlagEnvironment {
    pub fn new(project_key: &str, flag_key: &str, env: &Environment, defaults: Defaults, salt: String, now: i64) -> Self {
        Self {
            on: false,
            archived: false,
            salt,
            last_modified: now,
            version: 1,
            targets: Vec::new(),
            rules: Vec::new(),
            fallthrough: json!({ "variation": defaults.on_variation }),
            off_variation: defaults.off_variation,
            prerequisites: Vec::new(),
            track_events: false,
            track_events_fallthrough: false,
            site: Link {
                href: format!("/{project_key}/{}/features/{flag_key}", env.key),
                media_type: "text/html".to_string(),
            },
            environment_name: env.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub creation_date: i64,
    pub last_modified_date: i64,
    pub included: Vec<String>,
    pub excluded: Vec<String>,
    pub rules: Vec<Value>,
    pub unbounded: bool,
    pub version: u64,
    pub deleted: bool,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// Paged collection envelope shared by every list endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    #[serde(rename = "_links")]
    pub links: Links,
}

// --- request payloads ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub include_in_snippet_by_default: bool,
    pub environments: Option<Vec<EnvironmentInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInput {
    pub name: String,
    pub key: String,
    pub color: String,
    #[serde(default)]
    pub default_ttl: u32,
    #[serde(default)]
    pub secure_mode: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagInput {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variations: Vec<VariationInput>,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub client_side_availability: Option<ClientSideAvailability>,
    pub defaults: Option<Defaults>,
}

#[derive(Debug, Deserialize)]
pub struct VariationInput {
    pub value: Value,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SegmentInput {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub unbounded: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchInput {
    pub patch: Vec<PatchOperation>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub from: Option<String>,
    /// `Some(Null)` for an explicit `"value": null`, `None` when absent.
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
