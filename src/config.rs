//! Application configuration
//!
//! One YAML file describes the HTTP listener, the upstream GraphQL API and
//! its retry policy, the API user table and the optional warehouse.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! upstream:
//!   endpoint: https://api.stackadapt.com/graphql
//!   page_size: 1000
//!   max_retries: 10
//!   backoff: exponential
//! users:
//!   - username: analyst
//!     password: s3cret
//!   - username: partner
//!     password: p4ss
//!     allowed_routes: [/iMarketSolutions/conversionJourney]
//! warehouse:
//!   database: /data/mart.duckdb
//! ```

use crate::auth::UserEntry;
use crate::error::{Error, Result};
use crate::graphql::GraphqlClientConfig;
use crate::pagination::{RetryPolicy, DEFAULT_PAGE_SIZE};
use crate::types::BackoffType;
use crate::warehouse::WarehouseConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Route served from the warehouse instead of the GraphQL upstream
pub const WAREHOUSE_ROUTE: &str = "/iMarketSolutions/conversionJourney";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerSettings,

    /// GraphQL upstream and retry policy
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// API users
    #[serde(default)]
    pub users: Vec<UserEntry>,

    /// Conversion journey mart; the warehouse route answers 500 without it
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,
}

impl AppConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.upstream.validate()?;

        if self.users.is_empty() {
            return Err(Error::invalid_config("users", "at least one user is required"));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.is_empty() {
                return Err(Error::invalid_config("users", "username cannot be empty"));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(Error::invalid_config(
                    "users",
                    format!("duplicate user '{}'", user.username),
                ));
            }
            if let Some(route) = user
                .allowed_routes
                .iter()
                .find(|route| !served_routes().any(|served| served == route.as_str()))
            {
                return Err(Error::invalid_config(
                    "users",
                    format!("user '{}' is restricted to unknown route '{route}'", user.username),
                ));
            }
        }

        if let Some(warehouse) = &self.warehouse {
            if warehouse.database.trim().is_empty() {
                return Err(Error::invalid_config("warehouse.database", "cannot be empty"));
            }
            if warehouse.table.trim().is_empty() {
                return Err(Error::invalid_config("warehouse.table", "cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Every authenticated route the server answers
pub fn served_routes() -> impl Iterator<Item = &'static str> {
    crate::sources::SourceKind::all()
        .map(|kind| kind.definition().route)
        .chain(std::iter::once(WAREHOUSE_ROUTE))
}

// ============================================================================
// Server Settings
// ============================================================================

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServerSettings {
    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Upstream Config
// ============================================================================

/// GraphQL upstream and pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// GraphQL endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Nodes requested per page
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Retries per cursor
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,

    /// Fixed delay or exponential base, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Jitter upper bound, in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Cap on a single backoff delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_endpoint() -> String {
    GraphqlClientConfig::default().endpoint
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_jitter_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    300_000
}

fn default_timeout_secs() -> u64 {
    120
}

impl UpstreamConfig {
    /// Validate endpoint and page size
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| Error::invalid_config("upstream.endpoint", e.to_string()))?;

        if self.page_size <= 0 {
            return Err(Error::invalid_config(
                "upstream.page_size",
                format!("must be positive, got {}", self.page_size),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::invalid_config("upstream.timeout_secs", "must be positive"));
        }

        Ok(())
    }

    /// Client configuration for the single-page fetcher
    pub fn client_config(&self) -> GraphqlClientConfig {
        let mut builder = GraphqlClientConfig::builder()
            .endpoint(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Retry policy for the pagination driver
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.base_delay_ms);
        match self.backoff {
            BackoffType::Fixed => RetryPolicy::fixed(self.max_retries, base),
            BackoffType::Exponential => {
                RetryPolicy::exponential(self.max_retries, base, Duration::from_millis(self.jitter_ms))
                    .with_max_delay(Duration::from_millis(self.max_delay_ms))
            }
        }
    }
}
