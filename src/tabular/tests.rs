//! Tests for tabular shaping

use super::*;
use crate::types::Record;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn record(value: serde_json::Value) -> Record {
    value.as_object().unwrap().clone()
}

#[test]
fn test_flatten_nested_objects() {
    let node = json!({
        "attributes": {"date": "2024-01-01"},
        "campaignGroup": {
            "id": "7",
            "advertiser": {"id": "3", "name": "Acme"},
            "domainExclusions": ["a.com", "b.com"]
        },
        "metrics": {"clicks": 12, "ctr": 0.5}
    });

    let row = flatten_node(&node, &FlattenOptions::default());

    assert_eq!(
        row,
        record(json!({
            "attributes_date": "2024-01-01",
            "campaignGroup_id": "7",
            "campaignGroup_advertiser_id": "3",
            "campaignGroup_advertiser_name": "Acme",
            "campaignGroup_domainExclusions": ["a.com", "b.com"],
            "metrics_clicks": 12,
            "metrics_ctr": 0.5
        }))
    );
}

#[test]
fn test_flatten_custom_separator() {
    let node = json!({"a": {"b": {"c": 1}}});
    let row = flatten_node(&node, &FlattenOptions::with_separator("."));
    assert_eq!(row, record(json!({"a.b.c": 1})));
}

#[test]
fn test_flatten_non_object_node() {
    let row = flatten_node(&json!(42), &FlattenOptions::default());
    assert_eq!(row, record(json!({"value": 42})));
}

#[test]
fn test_to_table_unions_columns_and_fills_gaps() {
    let nodes = vec![
        json!({"id": "1", "ad": {"id": "a1", "name": null}}),
        json!({"id": "2", "ad": null, "extra": true}),
    ];

    let rows = to_table(&nodes, &FlattenOptions::default());

    assert_eq!(
        rows,
        vec![
            record(json!({"id": "1", "ad_id": "a1", "ad_name": "", "ad": "", "extra": ""})),
            record(json!({"id": "2", "ad_id": "", "ad_name": "", "ad": "", "extra": true})),
        ]
    );
}

#[test]
fn test_to_table_preserves_order() {
    let nodes: Vec<_> = (0..5).map(|i| json!({"n": i})).collect();
    let rows = to_table(&nodes, &FlattenOptions::default());
    let ns: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_to_table_empty() {
    assert!(to_table(&[], &FlattenOptions::default()).is_empty());
}

#[test_case("2024-03-01T10:15:00-0500", Some(-300) ; "compact offset")]
#[test_case("2024-03-01T10:15:00+05:30", Some(330) ; "rfc3339 offset")]
#[test_case("2024-03-01T10:15:00Z", Some(0) ; "zulu")]
#[test_case("2024-03-01T10:15:00.123+0100", Some(60) ; "fractional seconds")]
#[test_case("2024-03-01T10:15:00", None ; "no offset")]
#[test_case("yesterday", None ; "garbage")]
fn test_utc_offset_minutes(input: &str, expected: Option<i32>) {
    assert_eq!(utc_offset_minutes(input), expected);
}

#[test]
fn test_append_utc_offset_column() {
    let mut rows = vec![
        record(json!({"conversionStats_conversionTime": "2024-03-01T10:15:00-04:00"})),
        record(json!({"conversionStats_conversionTime": ""})),
        record(json!({"other": 1})),
    ];

    append_utc_offset_column(
        &mut rows,
        "conversionStats_conversionTime",
        "timeDifferenceFromUTCinMins",
    );

    assert_eq!(rows[0]["timeDifferenceFromUTCinMins"], json!(-240));
    assert_eq!(rows[1]["timeDifferenceFromUTCinMins"], json!(""));
    assert_eq!(rows[2]["timeDifferenceFromUTCinMins"], json!(""));
}
