//! Credentials and session acquisition

use anyhow::{Context, Result};
use serde::Deserialize;

/// How to authenticate against an instance
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static bearer token
    Token(String),
    /// Email/password login returning a session token
    Login { email: String, password: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => write!(f, "Token(***)"),
            Credentials::Login { email, .. } => write!(f, "Login {{ email: {:?}, password: *** }}", email),
        }
    }
}

impl Credentials {
    pub fn label(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "token",
            Credentials::Login { .. } => "login",
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
}

/// Resolve credentials into a bearer token
pub async fn acquire_token(http: &reqwest::Client, base_url: &str, credentials: &Credentials) -> Result<String> {
    match credentials {
        Credentials::Token(token) => Ok(token.clone()),
        Credentials::Login { email, password } => {
            let url = format!("{}/auth/login", base_url);
            log::debug!("Logging in to {} as {}", base_url, email);

            let response = http
                .post(&url)
                .json(&serde_json::json!({ "email": email, "password": password }))
                .send()
                .await
                .with_context(|| format!("Failed to reach {}", url))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Login to {} failed with HTTP {}: {}", base_url, status.as_u16(), body);
            }

            let login: LoginResponse = response
                .json()
                .await
                .context("Failed to parse login response")?;

            log::info!("Acquired session for {} on {}", email, base_url);
            Ok(login.data.access_token)
        }
    }
}
