//! Configuration file handling
//!
//! Environments and migration defaults live in a TOML file, by default
//! `~/.config/directus-migrate/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Credentials;
use crate::graph::{DEFAULT_RESERVED_PREFIX, GraphOptions};
use crate::transfer::TransferOptions;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub migration: MigrationDefaults,
}

/// One configured instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub url: String,
    /// Static bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Environment variable holding a bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    /// Login email, used with `password_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Environment variable holding the login password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

/// Defaults applied to every run unless overridden on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationDefaults {
    pub preserve_ids: bool,
    pub skip_admin_records: bool,
    pub skip_missing_prerequisites: bool,
    pub reserved_prefix: String,
    pub request_timeout_secs: u64,
}

impl Default for MigrationDefaults {
    fn default() -> Self {
        Self {
            preserve_ids: true,
            skip_admin_records: true,
            skip_missing_prerequisites: true,
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl MigrationDefaults {
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            preserve_identifiers: self.preserve_ids,
            skip_if_missing_prerequisite: self.skip_missing_prerequisites,
            skip_admin_like_records: self.skip_admin_records,
        }
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            reserved_prefix: self.reserved_prefix.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Default config location (~/.config/directus-migrate/config.toml)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("directus-migrate")
            .join("config.toml")
    }

    /// Load from `path`, or from the default location
    ///
    /// A missing file at the default location yields an empty config; an
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content).with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} environments from {}",
            config.environments.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.environments.keys().map(|k| k.as_str()).collect();
            if known.is_empty() {
                anyhow::anyhow!("Unknown environment '{}': no environments are configured", name)
            } else {
                anyhow::anyhow!("Unknown environment '{}' (configured: {})", name, known.join(", "))
            }
        })
    }
}

impl EnvironmentConfig {
    /// Resolve credentials, reading referenced environment variables
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token {
            return Ok(Credentials::Token(token.clone()));
        }

        if let Some(var) = &self.token_env {
            let token = std::env::var(var)
                .with_context(|| format!("Environment variable {} (token_env) is not set", var))?;
            return Ok(Credentials::Token(token));
        }

        match (&self.email, &self.password_env) {
            (Some(email), Some(var)) => {
                let password = std::env::var(var)
                    .with_context(|| format!("Environment variable {} (password_env) is not set", var))?;
                Ok(Credentials::Login {
                    email: email.clone(),
                    password,
                })
            }
            (Some(_), None) => anyhow::bail!("'email' requires 'password_env'"),
            _ => anyhow::bail!("No credentials configured: set 'token', 'token_env', or 'email' with 'password_env'"),
        }
    }

    /// How this environment authenticates, without revealing secrets
    pub fn auth_summary(&self) -> String {
        if self.token.is_some() {
            "token".to_string()
        } else if let Some(var) = &self.token_env {
            format!("token from ${}", var)
        } else if let Some(email) = &self.email {
            format!("login as {}", email)
        } else {
            "none".to_string()
        }
    }
}
