//! Tabular shaping of result nodes
//!
//! Turns nested GraphQL nodes into flat rows:
//! - nested objects flattened into joined column names
//! - every row carries every column of the batch, gaps filled with `""`
//! - derived UTC-offset columns for ISO-8601 timestamps

mod flatten;
mod timezone;

pub use flatten::{flatten_node, to_table, FlattenOptions};
pub use timezone::{append_utc_offset_column, utc_offset_minutes};

#[cfg(test)]
mod tests;
