//! GraphQL HTTP client
//!
//! Provides the single-page fetcher:
//! - One POST per call, credential forwarded verbatim in `Authorization`
//! - Non-2xx statuses and connection failures surface as transport errors
//! - Bodies carrying an `errors` field surface as upstream query errors

use super::types::{GraphqlBody, PageRequest};
use crate::error::{Error, Result};
use crate::pagination::PageFetcher;
use crate::types::JsonValue;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the GraphQL client
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.stackadapt.com/graphql".to_string(),
            timeout: Duration::from_secs(120),
            default_headers: HashMap::new(),
            user_agent: format!("insights-relay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GraphqlClientConfig {
    /// Create a new config builder
    pub fn builder() -> GraphqlClientConfigBuilder {
        GraphqlClientConfigBuilder::default()
    }
}

/// Builder for GraphQL client config
#[derive(Default)]
pub struct GraphqlClientConfigBuilder {
    config: GraphqlClientConfig,
}

impl GraphqlClientConfigBuilder {
    /// Set the endpoint URL
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> GraphqlClientConfig {
        self.config
    }
}

/// GraphQL client, safe to share across concurrent pulls
#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    config: GraphqlClientConfig,
}

impl GraphqlClient {
    /// Create a new client with custom configuration
    pub fn new(config: GraphqlClientConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Perform one request and return the decoded payload
    pub async fn execute(&self, request: &PageRequest<'_>) -> Result<JsonValue> {
        let body = GraphqlBody::from_request(request);

        let mut req = self.client.post(&self.config.endpoint);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        req = req.header(AUTHORIZATION, request.credential).json(&body);

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let text = response.text().await?;
        let payload: JsonValue = serde_json::from_str(&text)?;

        if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
            return Err(Error::upstream_query(errors.clone()));
        }

        debug!(
            "GraphQL page fetched from {} (cursor: {:?})",
            self.config.endpoint, request.cursor
        );
        Ok(payload)
    }
}

#[async_trait]
impl PageFetcher for GraphqlClient {
    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<JsonValue> {
        self.execute(&request).await
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
