//! Warehouse configuration types

use serde::{Deserialize, Serialize};

/// In-process database, nothing attached
pub const IN_MEMORY: &str = ":memory:";

/// Default conversion journey mart table
pub const DEFAULT_TABLE: &str = "IMARKET_CONVERSION_JOURNEY";

/// Storage backend holding the mart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    /// Native DuckDB file (or `:memory:`)
    #[default]
    Duckdb,
    /// SQLite file through the DuckDB sqlite extension
    Sqlite,
    /// PostgreSQL through the DuckDB postgres extension
    Postgres,
}

/// Where the conversion journey mart lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Backend
    #[serde(default)]
    pub kind: WarehouseKind,

    /// File path, `:memory:` or connection string
    pub database: String,

    /// Table to read, optionally schema-qualified (`MART.CONVERSIONS`)
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl WarehouseConfig {
    /// DuckDB file warehouse reading `table`
    pub fn duckdb(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            kind: WarehouseKind::Duckdb,
            database: database.into(),
            table: table.into(),
        }
    }

    /// Whether anything has to be attached
    pub fn is_attached(&self) -> bool {
        !(self.kind == WarehouseKind::Duckdb && self.database == IN_MEMORY)
    }

    /// Connection info safe for logs (password masked)
    pub fn connection_info(&self) -> String {
        if let Some(at_pos) = self.database.find('@') {
            if let Some(colon_pos) = self.database[..at_pos].rfind(':') {
                let before_pass = &self.database[..=colon_pos];
                let after_at = &self.database[at_pos..];
                return format!("{before_pass}****{after_at}");
            }
        }
        self.database.clone()
    }
}
