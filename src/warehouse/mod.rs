//! Conversion journey warehouse source
//!
//! The conversion journey mart is read straight from a database rather than
//! the GraphQL upstream. DuckDB is the query engine; the mart itself can be a
//! DuckDB file, a SQLite file or a PostgreSQL database attached read-only.

mod engine;
mod query;
mod types;

pub use engine::{WarehouseEngine, TIMESTAMP_FORMAT};
pub use query::{
    quote_identifier, quote_table, ConversionJourneyQuery, ADVERTISER_ID_COLUMN,
    CONVERSION_TIME_COLUMN, TRACKER_COLUMN, TRACKER_PATTERNS,
};
pub use types::{WarehouseConfig, WarehouseKind, DEFAULT_TABLE, IN_MEMORY};
