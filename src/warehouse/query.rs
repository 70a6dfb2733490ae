//! Conversion journey mart query

use crate::error::{Error, Result};
use chrono::NaiveDate;

/// Column holding the conversion timestamp
pub const CONVERSION_TIME_COLUMN: &str = "Conversion Time";

/// Column holding the advertiser id
pub const ADVERTISER_ID_COLUMN: &str = "Advertiser ID";

/// Column holding the conversion tracker name
pub const TRACKER_COLUMN: &str = "Conversion Tracker";

/// Tracker name patterns kept by every query
pub const TRACKER_PATTERNS: [&str; 3] = ["%Phone Call%", "%Form Submit%", "%SchedulerStarted%"];

/// Filters for one mart read
///
/// Dates are inclusive calendar days; the end is turned into an exclusive
/// bound on the next day when the SQL is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionJourneyQuery {
    /// First day, inclusive
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive
    pub end_date: Option<NaiveDate>,
    /// Advertiser ids; empty means every advertiser
    pub advertiser_ids: Vec<String>,
}

impl ConversionJourneyQuery {
    /// Unfiltered query (tracker filter only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first day
    #[must_use]
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Set the last day
    #[must_use]
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Restrict to these advertisers
    #[must_use]
    pub fn advertiser_ids(mut self, ids: Vec<String>) -> Self {
        self.advertiser_ids = ids;
        self
    }

    /// Reject an inverted window
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::invalid_input(
                    "startDate",
                    "startDate cannot be greater than endDate",
                ));
            }
        }
        Ok(())
    }

    /// Build parameterized SQL against `table_ref` and its bind values
    pub fn to_sql(&self, table_ref: &str) -> Result<(String, Vec<String>)> {
        self.validate()?;

        let time = quote_identifier(CONVERSION_TIME_COLUMN);
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(start) = self.start_date {
            conditions.push(format!("CAST({time} AS DATE) >= CAST(? AS DATE)"));
            params.push(start.format("%Y-%m-%d").to_string());
        }

        if let Some(end) = self.end_date {
            let exclusive_end = end
                .succ_opt()
                .ok_or_else(|| Error::invalid_input("endDate", "date out of range"))?;
            conditions.push(format!("CAST({time} AS DATE) < CAST(? AS DATE)"));
            params.push(exclusive_end.format("%Y-%m-%d").to_string());
        }

        if !self.advertiser_ids.is_empty() {
            let placeholders = vec!["?"; self.advertiser_ids.len()].join(", ");
            conditions.push(format!(
                "CAST({} AS VARCHAR) IN ({placeholders})",
                quote_identifier(ADVERTISER_ID_COLUMN)
            ));
            params.extend(self.advertiser_ids.iter().cloned());
        }

        let tracker = quote_identifier(TRACKER_COLUMN);
        let tracker_filter = TRACKER_PATTERNS
            .iter()
            .map(|_| format!("{tracker} ILIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        conditions.push(format!("({tracker_filter})"));
        params.extend(TRACKER_PATTERNS.iter().map(|p| (*p).to_string()));

        let sql = format!(
            "SELECT * FROM {table_ref} WHERE {}",
            conditions.join(" AND ")
        );
        Ok((sql, params))
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote each part of a dotted table name
pub fn quote_table(name: &str) -> String {
    name.split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}
