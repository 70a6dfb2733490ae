//! GraphQL single-page fetcher
//!
//! Issues one authenticated GraphQL request per call and classifies the
//! outcome. Retrying is left entirely to the pagination driver.
//!
//! # Features
//!
//! - **Pooled client**: one `reqwest::Client` shared by every pull
//! - **Explicit endpoint**: configured per client instance, never global
//! - **Error classification**: transport failures vs. upstream `errors` payloads

mod client;
mod types;

pub use client::{GraphqlClient, GraphqlClientConfig, GraphqlClientConfigBuilder};
pub use types::{PageRequest, QueryDescriptor, AFTER_VARIABLE, FIRST_VARIABLE};

#[cfg(test)]
mod tests;
