//! Typed errors returned by transports

/// Why a read from an instance failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Instance could not be reached (DNS, connect, timeout)
    Unreachable(String),
    /// Credentials were rejected
    Unauthorized(String),
    /// Any other non-success status
    Status(u16, String),
    /// The response could not be decoded
    Decode(String),
}

/// Error from listing a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub collection: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(collection: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            collection: collection.into(),
            kind,
        }
    }

    /// Unreachable instance or rejected credentials
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self.kind,
            FetchErrorKind::Unreachable(_) | FetchErrorKind::Unauthorized(_)
        )
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FetchErrorKind::Unreachable(msg) => {
                write!(f, "Failed to reach instance while listing {}: {}", self.collection, msg)
            }
            FetchErrorKind::Unauthorized(msg) => {
                write!(f, "Credentials rejected while listing {}: {}", self.collection, msg)
            }
            FetchErrorKind::Status(status, msg) => {
                write!(f, "Listing {} failed with HTTP {}: {}", self.collection, status, msg)
            }
            FetchErrorKind::Decode(msg) => {
                write!(f, "Failed to decode {} response: {}", self.collection, msg)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Error from a create or update rejected by an instance
///
/// `message` is the remote's message, kept verbatim for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    pub status: Option<u16>,
    pub message: String,
}

impl WriteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for WriteError {}
