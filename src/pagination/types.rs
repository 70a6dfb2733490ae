//! Pagination types and traits
//!
//! Defines the page shape, the tagged page outcome, the retry policy and the
//! fetcher seam used by the driver.

use crate::error::{Error, Result};
use crate::graphql::PageRequest;
use crate::types::{BackoffType, JsonValue, RecordsLayout};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

// ============================================================================
// Fetcher Seam
// ============================================================================

/// Fetches one raw page payload
///
/// Implemented by [`crate::graphql::GraphqlClient`]; tests substitute scripted
/// fetchers. Implementations must not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page described by `request`
    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<JsonValue>;
}

// ============================================================================
// Page Shape
// ============================================================================

/// Where the records container sits inside `data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// Top-level field under `data` (e.g. `campaignGroupInsight`)
    pub resource: String,
    /// Whether the container is `<resource>.records` or `<resource>` itself
    pub layout: RecordsLayout,
}

impl PageTarget {
    /// Create a target
    pub fn new(resource: impl Into<String>, layout: RecordsLayout) -> Self {
        Self {
            resource: resource.into(),
            layout,
        }
    }

    /// `data.<resource>.records`
    pub fn nested(resource: impl Into<String>) -> Self {
        Self::new(resource, RecordsLayout::Nested)
    }

    /// `data.<resource>`
    pub fn direct(resource: impl Into<String>) -> Self {
        Self::new(resource, RecordsLayout::Direct)
    }
}

/// Pagination metadata of one page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor to request the following page with
    #[serde(default)]
    pub end_cursor: Option<String>,
    /// Whether another page follows
    pub has_next_page: bool,
}

/// One validated page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Result nodes in upstream order
    pub nodes: Vec<JsonValue>,
    /// Pagination metadata
    pub page_info: PageInfo,
    /// Total size of the result set, when the query selects it
    pub total_count: Option<u64>,
}

impl Page {
    /// Whether this empty page really is the end of the result set
    ///
    /// Only trusted when upstream says there is nothing more and its
    /// `totalCount` matches what has already been collected.
    pub fn confirms_end(&self, accumulated: usize) -> bool {
        self.nodes.is_empty()
            && !self.page_info.has_next_page
            && self.total_count == Some(accumulated as u64)
    }
}

/// Validate the shape of a payload and pull out its page
pub fn extract_page(payload: JsonValue, target: &PageTarget) -> Result<Page> {
    let JsonValue::Object(mut root) = payload else {
        return Err(Error::malformed("response is not a JSON object"));
    };

    let Some(JsonValue::Object(mut data)) = root.remove("data") else {
        return Err(Error::malformed("missing 'data' in response"));
    };

    let mut resource = match data.remove(&target.resource) {
        Some(JsonValue::Object(resource)) => resource,
        _ => {
            return Err(Error::malformed(format!(
                "missing '{}' in response data",
                target.resource
            )))
        }
    };

    let mut container = match target.layout {
        RecordsLayout::Direct => resource,
        RecordsLayout::Nested => match resource.remove("records") {
            Some(JsonValue::Object(records)) => records,
            Some(JsonValue::Null) | None => {
                return Err(Error::malformed("missing 'records' in response data"))
            }
            Some(_) => return Err(Error::malformed("invalid 'records' data format")),
        },
    };

    let nodes = match container.remove("nodes") {
        Some(JsonValue::Array(nodes)) => nodes,
        Some(_) => return Err(Error::malformed("invalid 'nodes' data format")),
        None => return Err(Error::malformed("missing 'nodes' in records")),
    };

    let page_info: PageInfo = match container.remove("pageInfo") {
        Some(value @ JsonValue::Object(_)) => serde_json::from_value(value)
            .map_err(|e| Error::malformed(format!("invalid 'pageInfo': {e}")))?,
        Some(_) => return Err(Error::malformed("invalid 'pageInfo' data format")),
        None => return Err(Error::malformed("missing 'pageInfo' in records")),
    };

    if page_info.has_next_page && page_info.end_cursor.is_none() {
        return Err(Error::malformed("'hasNextPage' is true but 'endCursor' is null"));
    }

    let total_count = container.get("totalCount").and_then(JsonValue::as_u64);

    Ok(Page {
        nodes,
        page_info,
        total_count,
    })
}

// ============================================================================
// Page Outcome
// ============================================================================

/// Classified result of one page attempt
#[derive(Debug)]
pub enum PageOutcome {
    /// Validated page, ready to accumulate
    Success(Page),
    /// Failure expected to clear up on retry of the same cursor
    Transient(Error),
    /// Failure that ends the pull immediately
    Fatal(Error),
}

impl PageOutcome {
    /// Classify a fetch result
    pub fn classify(
        result: Result<JsonValue>,
        target: &PageTarget,
        cursor: Option<&str>,
        accumulated: usize,
    ) -> Self {
        let payload = match result {
            Ok(payload) => payload,
            Err(e) if e.is_transient() => return Self::Transient(e),
            Err(e) => return Self::Fatal(e),
        };

        match extract_page(payload, target) {
            Ok(page) if page.nodes.is_empty() && !page.confirms_end(accumulated) => {
                Self::Transient(Error::empty_page(cursor))
            }
            Ok(page) => Self::Success(page),
            Err(e) => Self::Transient(e),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Check if this is a transient failure
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Retry bound and backoff for one pull
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed per cursor before the pull fails
    pub max_retries: u32,
    /// Backoff strategy
    pub backoff_type: BackoffType,
    /// Fixed delay, or the exponential base
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter (exponential only)
    pub jitter: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_type: BackoffType::Exponential,
            base_delay: Duration::from_secs(1),
            jitter: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Constant delay between retries
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff_type: BackoffType::Fixed,
            base_delay: delay,
            jitter: Duration::ZERO,
            max_delay: delay,
        }
    }

    /// Exponential delay with jitter
    pub fn exponential(max_retries: u32, base_delay: Duration, jitter: Duration) -> Self {
        Self {
            max_retries,
            backoff_type: BackoffType::Exponential,
            base_delay,
            jitter,
            ..Self::default()
        }
    }

    /// Set the delay cap
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before the `retry`-th retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Fixed => self.base_delay,
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(retry);
                let jitter = if self.jitter.is_zero() {
                    Duration::ZERO
                } else {
                    self.jitter.mul_f64(rand::thread_rng().gen_range(0.0..=1.0))
                };
                self.base_delay.saturating_mul(factor) + jitter
            }
        };

        std::cmp::min(delay, self.max_delay)
    }
}

// ============================================================================
// State and Stats
// ============================================================================

/// Counters for one pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationStats {
    /// Pages accepted into the result
    pub pages: u32,
    /// Requests issued, including retried ones
    pub requests: u32,
    /// Backoff waits taken
    pub retries: u32,
}

/// Driver-local state threaded through each iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor of the next page to request
    pub cursor: Option<String>,
    /// Consecutive failed attempts at the current cursor
    pub retries: u32,
    /// Set once `hasNextPage` was false
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted page
    pub fn advance(&mut self, page_info: &PageInfo) {
        self.retries = 0;
        if page_info.has_next_page {
            self.cursor.clone_from(&page_info.end_cursor);
        } else {
            self.done = true;
        }
    }

    /// Record a failed attempt, returning the new retry count
    pub fn record_failure(&mut self) -> u32 {
        self.retries += 1;
        self.retries
    }
}

/// Complete, ordered result of a pull
#[derive(Debug, Clone, Default)]
pub struct Paginated {
    /// All nodes in page order, then within-page order
    pub nodes: Vec<JsonValue>,
    /// Counters
    pub stats: PaginationStats,
}
