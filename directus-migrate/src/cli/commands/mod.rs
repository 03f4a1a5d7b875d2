//! Command handlers

pub mod env;
pub mod order;
pub mod run;

use anyhow::Result;

use crate::api::HttpTransport;
use crate::config::Config;

/// Connect to a configured environment
pub(crate) async fn connect(config: &Config, name: &str) -> Result<HttpTransport> {
    let environment = config.environment(name)?;
    let credentials = environment.credentials()?;
    HttpTransport::connect(name, &environment.url, &credentials, config.migration.request_timeout()).await
}
