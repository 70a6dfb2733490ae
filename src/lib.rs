// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # insights-relay
//!
//! Pulls ad-performance and conversion data out of a cursor-paginated
//! GraphQL API, flattens it into rows and serves it over authenticated
//! HTTP routes.
//!
//! ## Features
//!
//! - **Resilient pagination**: retries a failed page at the same cursor with bounded backoff
//! - **All-or-nothing pulls**: a pull returns every record in upstream order, or an error
//! - **Tabular output**: nested nodes flattened into `parent_child` columns
//! - **Warehouse source**: the conversion journey mart read through DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use insights_relay::graphql::{GraphqlClient, GraphqlClientConfig};
//! use insights_relay::pagination::RetryPolicy;
//! use insights_relay::sources::{parse_date, PullRequest, Puller, SourceKind};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> insights_relay::Result<()> {
//!     let client = GraphqlClient::new(GraphqlClientConfig::default())?;
//!     let puller = Puller::new(client, 1000, RetryPolicy::default());
//!
//!     let request = PullRequest::new(
//!         SourceKind::CampaignGroupInsights,
//!         "Bearer <api key>",
//!         parse_date("start", "2024-01-01")?,
//!         parse_date("end", "2024-01-31")?,
//!     );
//!     let output = puller.pull(&request, &CancellationToken::new()).await?;
//!     println!("{} rows", output.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            HTTP routes (Basic auth, APIKey header)           │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                                  │
//! ┌───────────────┴──────────────┐      ┌────────────┴───────────┐
//! │ Puller: dates → rows         │      │ Warehouse (DuckDB)     │
//! ├──────────────────────────────┤      │ conversion journey     │
//! │ PaginationDriver: cursor,    │      └────────────────────────┘
//! │ retry, backoff, accumulate   │
//! ├──────────────────────────────┤
//! │ GraphqlClient: one page      │
//! └──────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Inbound Basic auth and outbound bearer credentials
pub mod auth;

/// GraphQL single-page fetcher
pub mod graphql;

/// Cursor pagination driver with retry and backoff
pub mod pagination;

/// Flattening of nodes into rows
pub mod tabular;

/// Built-in sources and the pull operation
pub mod sources;

/// Conversion journey warehouse via DuckDB
pub mod warehouse;

/// Application configuration
pub mod config;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::*;

pub use pagination::{PageFetcher, PaginationDriver, RetryPolicy};
pub use sources::{PullRequest, Puller, SourceKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
