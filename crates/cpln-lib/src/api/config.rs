//! API client configuration

use crate::error::{Error, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Public Control Plane API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.cpln.io";

/// Connection settings for [`ApiClient`](super::ApiClient)
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Organization all requests are scoped to
    #[serde(default)]
    pub org: String,

    /// Bearer token (service account key or user token)
    pub token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("org", &self.org)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(org: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            org: org.into(),
            token: token.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load from `CPLN_ENDPOINT`, `CPLN_ORG`, `CPLN_TOKEN` and `CPLN_TIMEOUT_SECS`
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder().add_source(Environment::with_prefix("CPLN").try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations no request could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("token is required".to_string()));
        }
        if self.org.trim().is_empty() {
            return Err(Error::Config("org is required".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder<DefaultState> {
        Config::builder()
    }

    #[test]
    fn test_defaults_applied() {
        let config = ClientConfig::from_builder(
            builder()
                .set_override("org", "acme")
                .unwrap()
                .set_override("token", "secret")
                .unwrap(),
        )
        .unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.org, "acme");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_builder(
            builder()
                .set_override("endpoint", "http://localhost:8080")
                .unwrap()
                .set_override("org", "acme")
                .unwrap()
                .set_override("token", "secret")
                .unwrap()
                .set_override("timeout_secs", 5)
                .unwrap(),
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = ClientConfig::from_builder(builder().set_override("org", "acme").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("acme", "secret").validate().is_ok());
        assert!(ClientConfig::new("", "secret").validate().is_err());
        assert!(ClientConfig::new("acme", " ").validate().is_err());
        assert!(ClientConfig::new("acme", "secret")
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", ClientConfig::new("acme", "super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("acme"));
    }
}
