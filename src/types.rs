//! Common types used throughout insights-relay
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One flattened output row: joined field path to scalar value
pub type Record = serde_json::Map<String, JsonValue>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy between retries of the same page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Fixed,
    /// `base * 2^retry` plus uniform random jitter
    #[default]
    Exponential,
}

// ============================================================================
// Records Layout
// ============================================================================

/// Where a resource keeps its `nodes`/`pageInfo` pair in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordsLayout {
    /// `data.<resource>.records.{nodes,pageInfo}`
    #[default]
    Nested,
    /// `data.<resource>.{nodes,pageInfo}`
    Direct,
}
