//! Pagination module
//!
//! Cursor pagination over GraphQL connections (`nodes` + `pageInfo`).
//!
//! # Overview
//!
//! The driver keeps the cursor as local state, classifies every page attempt
//! as success, transient or fatal, and retries transient failures at the same
//! cursor with fixed or exponential-with-jitter backoff until a bounded number
//! of retries is exhausted.

mod driver;
mod types;

pub use driver::{PaginationDriver, DEFAULT_PAGE_SIZE};
pub use types::{
    extract_page, Page, PageFetcher, PageInfo, PageOutcome, PageTarget, Paginated,
    PaginationState, PaginationStats, RetryPolicy,
};
