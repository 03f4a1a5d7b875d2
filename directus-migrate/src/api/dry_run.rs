//! Transport wrapper that reads from the target but never writes

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::error::{FetchError, WriteError};
use super::query::Filter;
use super::transport::{Record, Transport};

/// Delegates reads to `inner`; writes are logged and echoed back
pub struct DryRunTransport<T> {
    inner: T,
}

impl<T: Transport> DryRunTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for DryRunTransport<T> {
    async fn list(&self, collection: &str, filter: Option<&Filter>) -> Result<Vec<Record>, FetchError> {
        self.inner.list(collection, filter).await
    }

    async fn create(&self, collection: &str, body: &Record) -> Result<Record, WriteError> {
        let mut record = body.clone();
        if record.get("id").is_none_or(Value::is_null) {
            record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        log::info!("[dry-run] would create {} record {}", collection, record["id"]);
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, body: &Record) -> Result<Record, WriteError> {
        let mut record = body.clone();
        record.insert("id".to_string(), Value::String(id.to_string()));
        log::info!("[dry-run] would update {} record {} ({} fields)", collection, id, body.len());
        Ok(record)
    }
}
