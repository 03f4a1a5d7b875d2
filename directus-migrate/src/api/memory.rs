//! In-memory transport used by tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{FetchError, FetchErrorKind, WriteError};
use super::operations::Operation;
use super::query::Filter;
use super::transport::{Record, Transport, record_id};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Vec<Record>>,
    writes: Vec<Operation>,
    next_id: u64,
}

/// Transport over in-process collections that records every write
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
    failing_lists: HashMap<String, FetchErrorKind>,
    failing_writes: HashSet<(String, String)>,
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record fixture must be an object, got {}", other),
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with records
    pub fn with_records(self, collection: &str, records: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), records.into_iter().map(into_record).collect());
        self
    }

    /// Make listing `collection` fail
    pub fn failing_list(mut self, collection: &str, kind: FetchErrorKind) -> Self {
        self.failing_lists.insert(collection.to_string(), kind);
        self
    }

    /// Reject writes whose body has `field == value`
    pub fn failing_write(mut self, field: &str, value: &str) -> Self {
        self.failing_writes.insert((field.to_string(), value.to_string()));
        self
    }

    /// Every write received, in order
    pub fn writes(&self) -> Vec<Operation> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Current contents of a collection
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn rejects(&self, body: &Record) -> bool {
        self.failing_writes.iter().any(|(field, value)| {
            body.get(field)
                .and_then(super::transport::id_string)
                .is_some_and(|v| &v == value)
        })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn list(&self, collection: &str, filter: Option<&Filter>) -> Result<Vec<Record>, FetchError> {
        if let Some(kind) = self.failing_lists.get(collection) {
            return Err(FetchError::new(collection, kind.clone()));
        }
        let records = self.records(collection);
        Ok(match filter {
            Some(filter) => records.into_iter().filter(|r| filter.matches(r)).collect(),
            None => records,
        })
    }

    async fn create(&self, collection: &str, body: &Record) -> Result<Record, WriteError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Operation::create(collection, body.clone()));

        if self.rejects(body) {
            return Err(WriteError::new(Some(400), "Invalid payload: rejected by test"));
        }

        let mut record = body.clone();
        let id = match record_id(&record, "id") {
            Some(id) => id,
            None => {
                state.next_id += 1;
                let id = format!("{}-new-{}", collection, state.next_id);
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let existing = state.collections.entry(collection.to_string()).or_default();
        if existing.iter().any(|r| record_id(r, "id").as_deref() == Some(id.as_str())) {
            return Err(WriteError::new(Some(400), format!("Value for field \"id\" has to be unique: {}", id)));
        }
        existing.push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, body: &Record) -> Result<Record, WriteError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Operation::update(collection, id, body.clone()));

        if self.rejects(body) {
            return Err(WriteError::new(Some(400), "Invalid payload: rejected by test"));
        }

        let existing = state.collections.entry(collection.to_string()).or_default();
        let Some(record) = existing
            .iter_mut()
            .find(|r| record_id(r, "id").as_deref() == Some(id))
        else {
            return Err(WriteError::new(Some(404), format!("{} {} not found", collection, id)));
        };

        for (field, value) in body {
            record.insert(field.clone(), value.clone());
        }
        Ok(record.clone())
    }
}
