//! DuckDB-based warehouse reader
//!
//! Opens an in-memory DuckDB connection and attaches the configured mart
//! read-only. Queries are blocking; async callers run them through
//! `tokio::task::spawn_blocking`.

use super::query::{quote_table, ConversionJourneyQuery};
use super::types::{WarehouseConfig, WarehouseKind};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Output format of timestamp columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Rows between progress log lines
const PROGRESS_INTERVAL: usize = 10_000;

/// Attach alias of the external database
const ATTACH_ALIAS: &str = "source_db";

/// Read-only access to the conversion journey mart
pub struct WarehouseEngine {
    conn: Mutex<Connection>,
    table_ref: String,
    config: WarehouseConfig,
}

impl WarehouseEngine {
    /// Open the warehouse described by `config`
    pub fn open(config: &WarehouseConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::warehouse(format!("Failed to create DuckDB connection: {e}")))?;
        Self::attach(&conn, config)?;

        let table = quote_table(&config.table);
        let table_ref = if config.is_attached() {
            format!("{ATTACH_ALIAS}.{table}")
        } else {
            table
        };

        debug!("Opened warehouse {} ({})", config.connection_info(), table_ref);

        Ok(Self {
            conn: Mutex::new(conn),
            table_ref,
            config: config.clone(),
        })
    }

    fn attach(conn: &Connection, config: &WarehouseConfig) -> Result<()> {
        if !config.is_attached() {
            return Ok(());
        }

        let location = config.database.replace('\'', "''");
        let attach_sql = match config.kind {
            WarehouseKind::Duckdb => format!("ATTACH '{location}' AS {ATTACH_ALIAS} (READ_ONLY);"),
            WarehouseKind::Sqlite => format!(
                "INSTALL sqlite; LOAD sqlite; ATTACH '{location}' AS {ATTACH_ALIAS} (TYPE SQLITE, READ_ONLY);"
            ),
            WarehouseKind::Postgres => format!(
                "INSTALL postgres; LOAD postgres; ATTACH '{location}' AS {ATTACH_ALIAS} (TYPE POSTGRES, READ_ONLY);"
            ),
        };

        conn.execute_batch(&attach_sql).map_err(|e| {
            Error::warehouse(format!(
                "Failed to attach {}: {e}",
                config.connection_info()
            ))
        })
    }

    /// Fully qualified, quoted table reference
    pub fn table_ref(&self) -> &str {
        &self.table_ref
    }

    /// Configuration this engine was opened with
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::warehouse("warehouse connection lock poisoned"))
    }

    /// Check that the configured table is readable
    pub fn check_connection(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!("SELECT * FROM {} LIMIT 0", self.table_ref))
            .map_err(|e| Error::warehouse(format!("Connection check failed: {e}")))
    }

    /// Read every row matching `query`
    pub fn fetch(&self, query: &ConversionJourneyQuery) -> Result<Vec<Record>> {
        let (sql, params) = query.to_sql(&self.table_ref)?;
        debug!("Executing warehouse query: {}", sql);

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::warehouse(format!("Failed to prepare query: {e}")))?;
        let mut rows = stmt
            .query(duckdb::params_from_iter(params.iter()))
            .map_err(|e| Error::warehouse(format!("Query failed: {e}")))?;

        let columns: Vec<String> = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (idx, name) in columns.iter().enumerate() {
                let value: Value = row.get(idx)?;
                record.insert(name.clone(), value_to_json(value));
            }
            records.push(record);

            if records.len() % PROGRESS_INTERVAL == 0 {
                debug!("Read {} warehouse rows", records.len());
            }
        }

        Ok(records)
    }
}

impl std::fmt::Debug for WarehouseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseEngine")
            .field("database", &self.config.connection_info())
            .field("table_ref", &self.table_ref)
            .finish_non_exhaustive()
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Convert a DuckDB value to JSON; timestamps use [`TIMESTAMP_FORMAT`] in UTC
pub(crate) fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::from(i),
        Value::SmallInt(i) => JsonValue::from(i),
        Value::Int(i) => JsonValue::from(i),
        Value::BigInt(i) => JsonValue::from(i),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::from(i),
        Value::USmallInt(i) => JsonValue::from(i),
        Value::UInt(i) => JsonValue::from(i),
        Value::UBigInt(i) => JsonValue::from(i),
        Value::Float(f) => JsonValue::from(f64::from(f)),
        Value::Double(f) => JsonValue::from(f),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::Timestamp(unit, t) => {
            let micros = to_micros(unit, t);
            let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).unwrap_or_default();
            DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos)
                .map(|dt| JsonValue::String(dt.format(TIMESTAMP_FORMAT).to_string()))
                .unwrap_or(JsonValue::Null)
        }
        Value::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(TimeDelta::days(i64::from(days))))
            .map(|date| JsonValue::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(JsonValue::Null),
        Value::Time64(unit, t) => {
            let micros = to_micros(unit, t);
            u32::try_from(micros / 1_000_000)
                .ok()
                .and_then(|secs| {
                    let nanos = u32::try_from((micros % 1_000_000) * 1_000).ok()?;
                    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                })
                .map(|time| JsonValue::String(time.format("%H:%M:%S").to_string()))
                .unwrap_or(JsonValue::Null)
        }
        Value::List(items) => {
            JsonValue::Array(items.into_iter().map(value_to_json).collect())
        }
        other => JsonValue::String(format!("{other:?}")),
    }
}
