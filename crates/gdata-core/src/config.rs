//! Service configuration.
//!
//! Every key is optional; an empty document yields `ServiceConfig::default()`.
use serde::Deserialize;
use thiserror::Error;

use crate::types::ServiceUrl;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML in service config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings a [`Service`](crate::Service) is built with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base for relative feed URIs.
    pub base_url: ServiceUrl,

    /// Protocol version, sent as the `GData-Version` header.
    pub api_version: String,

    /// Language for server-generated text, sent as the `hl` parameter.
    pub locale: Option<String>,

    /// Refuse updates and deletes of entries the signed-in account did not author.
    pub enforce_ownership: bool,
}

impl ServiceConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.google.com";

    pub fn new(base_url: ServiceUrl) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("service config is empty, using defaults");
            return Ok(Self::default());
        }
        let config: ServiceConfig = toml::from_str(content)?;
        tracing::debug!(base_url = %config.base_url, api_version = %config.api_version, "loaded service config");
        Ok(config)
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_enforce_ownership(mut self, enforce: bool) -> Self {
        self.enforce_ownership = enforce;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: ServiceUrl::new(Self::DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_version: "2".to_string(),
            locale: None,
            enforce_ownership: true,
        }
    }
}
