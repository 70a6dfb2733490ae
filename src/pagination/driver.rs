//! Pagination driver
//!
//! Drives cursor pagination to completion, one page at a time. Transient
//! failures are retried at the same cursor with backoff until the retry bound
//! is exceeded; anything else ends the pull. Partial results are never
//! returned on failure.

use super::types::{
    PageFetcher, PageOutcome, PageTarget, Paginated, PaginationState, RetryPolicy,
};
use crate::error::{Error, Result};
use crate::graphql::{PageRequest, QueryDescriptor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Page size used by every upstream source unless configured otherwise
pub const DEFAULT_PAGE_SIZE: i64 = 1000;

/// Cursor-pagination driver
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    target: PageTarget,
    page_size: i64,
    policy: RetryPolicy,
}

impl PaginationDriver {
    /// Create a driver for a target with default page size and policy
    pub fn new(target: PageTarget) -> Self {
        Self {
            target,
            page_size: DEFAULT_PAGE_SIZE,
            policy: RetryPolicy::default(),
        }
    }

    /// Set the page size (validated when a pull starts)
    #[must_use]
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The page target
    pub fn target(&self) -> &PageTarget {
        &self.target
    }

    /// The retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn validated_page_size(&self) -> Result<u32> {
        if self.page_size <= 0 {
            return Err(Error::config(format!(
                "page size must be positive, got {}",
                self.page_size
            )));
        }
        u32::try_from(self.page_size)
            .map_err(|_| Error::config(format!("page size {} is too large", self.page_size)))
    }

    /// Fetch every page for `descriptor`
    pub async fn fetch_all(
        &self,
        fetcher: &dyn PageFetcher,
        credential: &str,
        descriptor: &QueryDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Paginated> {
        let page_size = self.validated_page_size()?;
        let mut state = PaginationState::new();
        let mut result = Paginated::default();

        while !state.done {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let request = PageRequest {
                credential,
                descriptor,
                cursor: state.cursor.as_deref(),
                page_size,
            };
            result.stats.requests += 1;

            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                fetched = fetcher.fetch_page(request) => fetched,
            };

            let outcome = PageOutcome::classify(
                fetched,
                &self.target,
                state.cursor.as_deref(),
                result.nodes.len(),
            );

            match outcome {
                PageOutcome::Success(page) => {
                    result.stats.pages += 1;
                    debug!(
                        "{}: page {} with {} nodes (next: {})",
                        self.target.resource,
                        result.stats.pages,
                        page.nodes.len(),
                        page.page_info.has_next_page
                    );
                    state.advance(&page.page_info);
                    result.nodes.extend(page.nodes);
                }
                PageOutcome::Transient(cause) => {
                    let retry = state.record_failure();
                    if retry > self.policy.max_retries {
                        warn!(
                            "{}: giving up at cursor {:?} after {} retries: {cause}",
                            self.target.resource, state.cursor, self.policy.max_retries
                        );
                        return Err(Error::max_retries(self.policy.max_retries, &cause));
                    }

                    let delay = self.policy.delay_for(retry);
                    result.stats.retries += 1;
                    warn!(
                        "{}: {cause}; retry {}/{} at cursor {:?} in {:?}",
                        self.target.resource,
                        retry,
                        self.policy.max_retries,
                        state.cursor,
                        delay
                    );

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                PageOutcome::Fatal(err) => return Err(err),
            }
        }

        info!(
            "{}: fetched {} nodes in {} pages ({} requests, {} retries)",
            self.target.resource,
            result.nodes.len(),
            result.stats.pages,
            result.stats.requests,
            result.stats.retries
        );

        Ok(result)
    }
}
