//! Nested JSON to flat rows

use crate::types::{JsonValue, Record};
use std::collections::BTreeSet;

/// Column separator used by every source
pub const DEFAULT_SEPARATOR: &str = "_";

/// Options for flattening
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// String placed between nested keys (`campaignGroup_advertiser_id`)
    pub separator: String,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl FlattenOptions {
    /// Use a custom separator
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

/// Flatten one node
///
/// Objects are walked recursively; arrays and scalars are copied as-is.
/// A node that is not an object lands in a single `value` column.
pub fn flatten_node(node: &JsonValue, options: &FlattenOptions) -> Record {
    let mut row = Record::new();
    match node {
        JsonValue::Object(_) => flatten_into(None, node, &options.separator, &mut row),
        other => {
            row.insert("value".to_string(), other.clone());
        }
    }
    row
}

fn flatten_into(prefix: Option<&str>, value: &JsonValue, separator: &str, row: &mut Record) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let column = match prefix {
                    Some(prefix) => format!("{prefix}{separator}{key}"),
                    None => key.clone(),
                };
                flatten_into(Some(&column), child, separator, row);
            }
        }
        leaf => {
            if let Some(column) = prefix {
                row.insert(column.to_string(), leaf.clone());
            }
        }
    }
}

/// Flatten a batch of nodes into rows sharing one column set
pub fn to_table(nodes: &[JsonValue], options: &FlattenOptions) -> Vec<Record> {
    let mut rows: Vec<Record> = nodes.iter().map(|n| flatten_node(n, options)).collect();

    let columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();

    for row in &mut rows {
        for column in &columns {
            match row.get_mut(column) {
                Some(value) if value.is_null() => *value = JsonValue::String(String::new()),
                Some(_) => {}
                None => {
                    row.insert(column.clone(), JsonValue::String(String::new()));
                }
            }
        }
    }

    rows
}
