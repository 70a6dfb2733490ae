//! The pull operation: dates in, flat rows out

use super::SourceKind;
use crate::error::{Error, Result};
use crate::graphql::GraphqlClient;
use crate::pagination::{PageFetcher, PaginationDriver, PaginationStats, RetryPolicy};
use crate::tabular::{to_table, FlattenOptions};
use crate::types::Record;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Variable carrying the inclusive window start
pub const START_TIME_VARIABLE: &str = "startTime";

/// Variable carrying the exclusive window end
pub const END_TIME_VARIABLE: &str = "endTime";

const DATE_FORMAT: &str = "%Y-%m-%d";
const MIDNIGHT_UTC: &str = "T00:00:00+0000";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        Error::invalid_input(field, format!("expected YYYY-MM-DD, got '{value}': {e}"))
    })
}

/// Split a comma-separated id list, trimming entries and dropping blanks
pub fn parse_id_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// Widen calendar dates into the half-open UTC window `[start 00:00, end+1 00:00)`
pub fn widen_date_range(start: NaiveDate, end: NaiveDate) -> Result<(String, String)> {
    if start > end {
        return Err(Error::invalid_input(
            "startDate",
            "startDate cannot be greater than endDate",
        ));
    }
    let exclusive_end = end
        .succ_opt()
        .ok_or_else(|| Error::invalid_input("endDate", "date out of range"))?;

    Ok((
        format!("{}{MIDNIGHT_UTC}", start.format(DATE_FORMAT)),
        format!("{}{MIDNIGHT_UTC}", exclusive_end.format(DATE_FORMAT)),
    ))
}

/// Source-specific filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullFilters {
    /// Campaign ids (conversion journey)
    pub campaign_ids: Vec<String>,
    /// Tracker ids (conversion journey)
    pub tracker_ids: Vec<String>,
    /// Delivery granularity (advertiser delivery)
    pub granularity: Option<String>,
}

/// One top-level pull
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// Source to pull
    pub source: SourceKind,
    /// Pre-formatted `Authorization` value, e.g. `Bearer <key>`
    pub credential: String,
    /// First calendar day, inclusive
    pub start_date: NaiveDate,
    /// Last calendar day, inclusive
    pub end_date: NaiveDate,
    /// Extra filters
    pub filters: PullFilters,
}

impl PullRequest {
    /// Create a request without extra filters
    pub fn new(
        source: SourceKind,
        credential: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            source,
            credential: credential.into(),
            start_date,
            end_date,
            filters: PullFilters::default(),
        }
    }

    /// Set the filters
    #[must_use]
    pub fn with_filters(mut self, filters: PullFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Complete, flattened result of a pull
#[derive(Debug, Clone, Default)]
pub struct PullOutput {
    /// Rows in upstream order
    pub records: Vec<Record>,
    /// Pagination counters
    pub stats: PaginationStats,
}

/// Runs pulls against one upstream; cheap to clone and share
#[derive(Clone)]
pub struct Puller {
    fetcher: Arc<dyn PageFetcher>,
    page_size: i64,
    policy: RetryPolicy,
    flatten: FlattenOptions,
}

impl Puller {
    /// Create a puller over a GraphQL client
    pub fn new(client: GraphqlClient, page_size: i64, policy: RetryPolicy) -> Self {
        Self::with_fetcher(Arc::new(client), page_size, policy)
    }

    /// Create a puller over any page fetcher
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, page_size: i64, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            page_size,
            policy,
            flatten: FlattenOptions::default(),
        }
    }

    /// Set flattening options
    #[must_use]
    pub fn with_flatten(mut self, flatten: FlattenOptions) -> Self {
        self.flatten = flatten;
        self
    }

    /// Pull every record for `request`
    pub async fn pull(&self, request: &PullRequest, cancel: &CancellationToken) -> Result<PullOutput> {
        let source = request.source;
        let (start_time, end_time) = widen_date_range(request.start_date, request.end_date)?;
        let descriptor = source.descriptor(start_time, end_time, &request.filters)?;

        let driver = PaginationDriver::new(source.page_target())
            .with_page_size(self.page_size)
            .with_policy(self.policy.clone());

        let paginated = driver
            .fetch_all(self.fetcher.as_ref(), &request.credential, &descriptor, cancel)
            .await?;

        let mut records = to_table(&paginated.nodes, &self.flatten);
        source.post_process(&mut records);

        info!(
            "Pulled {} records from {source} for {}..{}",
            records.len(),
            request.start_date,
            request.end_date
        );

        Ok(PullOutput {
            records,
            stats: paginated.stats,
        })
    }
}

impl std::fmt::Debug for Puller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Puller")
            .field("page_size", &self.page_size)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
