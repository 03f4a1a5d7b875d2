//! Write operations executed against a target instance

use serde::{Deserialize, Serialize};

use super::error::WriteError;
use super::transport::{Record, Transport};

/// A single write against a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new record
    Create {
        /// Collection name (e.g., "roles", "permissions")
        collection: String,
        /// Record body
        data: Record,
    },
    /// Update an existing record
    Update {
        /// Collection name
        collection: String,
        /// Identifier of the record in the target
        id: String,
        /// Fields to write
        data: Record,
    },
}

impl Operation {
    /// Create a new Create operation
    pub fn create(collection: impl Into<String>, data: Record) -> Self {
        Self::Create {
            collection: collection.into(),
            data,
        }
    }

    /// Create a new Update operation
    pub fn update(collection: impl Into<String>, id: impl Into<String>, data: Record) -> Self {
        Self::Update {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }

    /// Get the collection for this operation
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. } => collection,
            Self::Update { collection, .. } => collection,
        }
    }

    /// Get the record body for this operation
    pub fn data(&self) -> &Record {
        match self {
            Self::Create { data, .. } => data,
            Self::Update { data, .. } => data,
        }
    }

    /// Get the HTTP method for this operation
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "POST",
            Self::Update { .. } => "PATCH",
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
        }
    }

    /// Execute this operation against a transport
    pub async fn execute(&self, transport: &dyn Transport) -> Result<Record, WriteError> {
        match self {
            Self::Create { collection, data } => transport.create(collection, data).await,
            Self::Update { collection, id, data } => transport.update(collection, id, data).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_metadata() {
        let create = Operation::create("roles", Record::new());
        let update = Operation::update("roles", "r1", Record::new());

        assert_eq!(create.http_method(), "POST");
        assert_eq!(update.http_method(), "PATCH");
        assert_eq!(create.operation_type(), "create");
        assert_eq!(update.operation_type(), "update");
        assert_eq!(update.collection(), "roles");
    }
}
