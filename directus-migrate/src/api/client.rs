//! HTTP transport for the platform's REST API

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::auth::{Credentials, acquire_token};
use super::error::{FetchError, FetchErrorKind, WriteError};
use super::query::Filter;
use super::transport::{Record, Transport};

/// Collections served from the API root instead of `/items`
const SYSTEM_COLLECTIONS: &[&str] = &[
    "access",
    "collections",
    "fields",
    "files",
    "folders",
    "permissions",
    "policies",
    "relations",
    "roles",
    "users",
];

/// Path of a collection relative to the base URL
pub fn collection_path(collection: &str) -> String {
    let bare = collection.strip_prefix("directus_").unwrap_or(collection);
    if SYSTEM_COLLECTIONS.contains(&bare) {
        format!("/{}", bare)
    } else {
        format!("/items/{}", collection)
    }
}

/// Response envelope: every payload is wrapped in `data`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

/// Extract the remote's error messages, falling back to the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

/// Authenticated client for one instance
#[derive(Clone)]
pub struct HttpTransport {
    name: String,
    base_url: String,
    http: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

impl HttpTransport {
    /// Build an HTTP client and resolve credentials into a session token
    pub async fn connect(
        name: impl Into<String>,
        base_url: &str,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let name = name.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let token = acquire_token(&http, &base_url, credentials)
            .await
            .with_context(|| format!("Failed to authenticate against environment '{}'", name))?;

        log::info!("Connected to {} ({}) using {}", name, base_url, credentials.label());

        Ok(Self {
            name,
            base_url,
            http,
            token,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}{}", self.base_url, collection_path(collection))
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), urlencoding::encode(id))
    }

    async fn send_write(&self, request: reqwest::RequestBuilder, body: &Record) -> Result<Record, WriteError> {
        let response = request
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| WriteError::new(None, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WriteError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(WriteError::new(Some(status.as_u16()), error_message(&text)));
        }

        if text.trim().is_empty() {
            return Ok(body.clone());
        }

        let envelope: Envelope<Option<Record>> = serde_json::from_str(&text)
            .map_err(|e| WriteError::new(Some(status.as_u16()), format!("Invalid response body: {}", e)))?;

        Ok(envelope.data.unwrap_or_else(|| body.clone()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list(&self, collection: &str, filter: Option<&Filter>) -> Result<Vec<Record>, FetchError> {
        let mut url = format!("{}?limit=-1", self.collection_url(collection));
        if let Some(filter) = filter {
            url.push('&');
            url.push_str(&filter.to_query_param());
        }

        log::debug!("[{}] GET {}", self.name, url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| FetchError::new(collection, FetchErrorKind::Unreachable(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            let kind = match status.as_u16() {
                401 | 403 => FetchErrorKind::Unauthorized(message),
                code => FetchErrorKind::Status(code, message),
            };
            return Err(FetchError::new(collection, kind));
        }

        let envelope: Envelope<Vec<Record>> = response
            .json()
            .await
            .map_err(|e| FetchError::new(collection, FetchErrorKind::Decode(e.to_string())))?;

        log::info!("[{}] Fetched {} records from {}", self.name, envelope.data.len(), collection);
        Ok(envelope.data)
    }

    async fn create(&self, collection: &str, body: &Record) -> Result<Record, WriteError> {
        let url = self.collection_url(collection);
        log::debug!("[{}] POST {}", self.name, url);
        self.send_write(self.http.post(&url), body).await
    }

    async fn update(&self, collection: &str, id: &str, body: &Record) -> Result<Record, WriteError> {
        let url = self.record_url(collection, id);
        log::debug!("[{}] PATCH {}", self.name, url);
        self.send_write(self.http.patch(&url), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path() {
        assert_eq!(collection_path("roles"), "/roles");
        assert_eq!(collection_path("directus_policies"), "/policies");
        assert_eq!(collection_path("articles"), "/items/articles");
    }

    #[test]
    fn test_debug_masks_token() {
        let transport = HttpTransport {
            name: "staging".to_string(),
            base_url: "https://staging.example.com".to_string(),
            http: reqwest::Client::new(),
            token: "super-secret-token".to_string(),
        };

        let debug = format!("{:?}", transport);

        assert!(debug.contains("staging"));
        assert!(debug.contains("***"));
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"errors":[{"message":"Forbidden","extensions":{"code":"FORBIDDEN"}}]}"#;
        assert_eq!(error_message(body), "Forbidden");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "empty response body");
    }
}
