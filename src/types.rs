use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Opaque actor identifier: either a raw id (`nwua9Gu5YrADL7ZDj`) or the
/// `owner~name` form the registry also accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorRef(String);

impl ActorRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActorRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Registry `{"data": ...}` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Paginated list payload inside the `data` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Paginated<T> {
    #[allow(dead_code)]
    #[serde(default)]
    pub total: Option<u64>,
    pub items: Vec<T>,
}

/// One entry from the actor listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub modified_at: Option<OffsetDateTime>,
}

/// Full actor record. Fetched once per schema resolution; besides the
/// embedded schema candidates it supplies the latest version number and the
/// store-page scrape target (`username`/`name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorMetadata {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_number: Option<String>,
    /// Input schema embedded directly on the actor record; rarely populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Payload of a recorded example invocation, if the author published one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_run_input: Option<ExampleRunInput>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub modified_at: Option<OffsetDateTime>,
}

/// A recorded example invocation. `body` is the raw request payload, not
/// necessarily valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleRunInput {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One published actor version; only the latest is ever consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

/// A resolved input schema: a JSON object, either `{properties, required}`
/// shaped or an arbitrary example payload. Opaque to callers; the canonical
/// empty object means "nothing found anywhere", which is a valid outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(pub Map<String, Value>);

impl Schema {
    /// The canonical empty object `{}`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accept a JSON value as a schema iff it is an object with at least one
    /// key. Anything else is unusable for form rendering.
    pub(crate) fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// One field entry in a JSON-Schema-shaped result. Every part is optional:
/// a source may supply any subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

/// The `{properties, required}` shape synthesized by the store-page heading
/// heuristic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub properties: BTreeMap<String, Field>,
    pub required: Vec<String>,
}

impl PropertySchema {
    /// Convert into a [`Schema`], or `None` when no fields were collected.
    pub(crate) fn into_schema(self) -> Option<Schema> {
        if self.properties.is_empty() {
            return None;
        }
        serde_json::to_value(self).ok().and_then(Schema::from_value)
    }
}
