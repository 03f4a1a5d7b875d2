//! Transport abstraction over a remote instance

use async_trait::async_trait;
use serde_json::Value;

use super::error::{FetchError, WriteError};
use super::query::Filter;

/// A structured record keyed by field name, field order preserved
pub type Record = serde_json::Map<String, Value>;

/// Read and write access to one instance
///
/// Authentication is resolved when the transport is constructed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// List every record of a collection, optionally filtered
    async fn list(&self, collection: &str, filter: Option<&Filter>) -> Result<Vec<Record>, FetchError>;

    /// Create a record and return it as stored
    async fn create(&self, collection: &str, body: &Record) -> Result<Record, WriteError>;

    /// Update a record in place and return it as stored
    async fn update(&self, collection: &str, id: &str, body: &Record) -> Result<Record, WriteError>;
}

/// Render an identifier value as a string (ids may be UUID strings or integers)
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(id_string),
        _ => None,
    }
}

/// Identifier of a record, read from `field`
pub fn record_id(record: &Record, field: &str) -> Option<String> {
    record.get(field).and_then(id_string)
}
