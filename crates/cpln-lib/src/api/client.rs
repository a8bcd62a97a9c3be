//! HTTP transport for the Control Plane API

use super::config::ClientConfig;
use crate::discovery::{async_trait, DeploymentFetcher, WorkloadFetcher};
use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::Url;

/// Authenticated client for the workload and deployment endpoints
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    org: String,
    token: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("org", &self.org)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ApiClient {
    /// Create a client from validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.endpoint)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("cpln-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            org: config.org,
            token: config.token,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// `{endpoint}/org/{org}/gvc/{gvc}/workload` followed by `tail`
    fn workload_url(&self, gvc: &str, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("endpoint cannot be used as a base URL".to_string()))?
            .pop_if_empty()
            .extend(["org", self.org.as_str(), "gvc", gvc, "workload"])
            .extend(tail);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(Error::api(Some(status.as_u16()), message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Invalid JSON response: {e}")))
    }
}

#[async_trait]
impl WorkloadFetcher for ApiClient {
    async fn fetch_workload(&self, gvc: &str, workload: Option<&str>) -> Result<Value> {
        let url = match workload {
            Some(name) => self.workload_url(gvc, &[name])?,
            None => self.workload_url(gvc, &[])?,
        };
        self.get_json(url).await
    }
}

#[async_trait]
impl DeploymentFetcher for ApiClient {
    async fn fetch_workload_deployment(
        &self,
        gvc: &str,
        workload: &str,
        location: &str,
    ) -> Result<Value> {
        let url = self.workload_url(gvc, &[workload, "deployment", location])?;
        self.get_json(url).await
    }
}
