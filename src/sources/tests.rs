//! Tests for built-in sources and the pull operation

use super::*;
use crate::graphql::{GraphqlClient, GraphqlClientConfig};
use crate::pagination::RetryPolicy;
use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn puller_for(server: &MockServer, max_retries: u32) -> Puller {
    let config = GraphqlClientConfig::builder()
        .endpoint(format!("{}/graphql", server.uri()))
        .timeout(Duration::from_secs(5))
        .build();
    let client = GraphqlClient::new(config).unwrap();
    Puller::new(client, 2, RetryPolicy::fixed(max_retries, Duration::ZERO))
}

// ============================================================================
// Definition Tests
// ============================================================================

#[test]
fn test_every_source_has_a_consistent_definition() {
    for kind in SourceKind::all() {
        let def = kind.definition();
        assert_eq!(def.kind, kind);
        assert!(def.route.starts_with('/'));
        assert!(def.document.contains(def.resource));
        assert!(def.document.contains("$first"));
        assert!(def.document.contains("$after"));
        assert!(def.document.contains("pageInfo"));
        assert!(def.document.contains("totalCount"));
    }
}

#[test_case("campaign-group-insights", SourceKind::CampaignGroupInsights)]
#[test_case("campaignInsight", SourceKind::CampaignInsights)]
#[test_case("advertiser-delivery-stats", SourceKind::AdvertiserDeliveryStats)]
#[test_case("conversionPath", SourceKind::ConversionJourney)]
fn test_source_from_str(input: &str, expected: SourceKind) {
    assert_eq!(input.parse::<SourceKind>().unwrap(), expected);
}

#[test]
fn test_unknown_source() {
    let err = "nope".parse::<SourceKind>().unwrap_err();
    assert!(err.is_client_error());
}

// ============================================================================
// Date and Filter Tests
// ============================================================================

#[test]
fn test_widen_date_range() {
    let (start, end) = widen_date_range(date("2024-01-01"), date("2024-01-03")).unwrap();
    assert_eq!(start, "2024-01-01T00:00:00+0000");
    assert_eq!(end, "2024-01-04T00:00:00+0000");
}

#[test]
fn test_widen_date_range_month_and_year_boundaries() {
    let (_, end) = widen_date_range(date("2024-02-01"), date("2024-02-29")).unwrap();
    assert_eq!(end, "2024-03-01T00:00:00+0000");

    let (_, end) = widen_date_range(date("2023-12-31"), date("2023-12-31")).unwrap();
    assert_eq!(end, "2024-01-01T00:00:00+0000");
}

#[test]
fn test_widen_date_range_rejects_inverted() {
    let err = widen_date_range(date("2024-01-05"), date("2024-01-01")).unwrap_err();
    assert!(err.to_string().contains("startDate cannot be greater than endDate"));
}

#[test_case("2024-01-01", true ; "valid")]
#[test_case(" 2024-01-01 ", true ; "padded")]
#[test_case("2024-13-01", false ; "bad month")]
#[test_case("01/02/2024", false ; "wrong format")]
#[test_case("", false ; "empty")]
fn test_parse_date(input: &str, ok: bool) {
    assert_eq!(parse_date("startDate", input).is_ok(), ok);
}

#[test]
fn test_parse_id_list() {
    assert_eq!(parse_id_list(Some(" 1, 2 ,,3 ")), vec!["1", "2", "3"]);
    assert!(parse_id_list(Some(" , ")).is_empty());
    assert!(parse_id_list(None).is_empty());
}

#[test]
fn test_descriptor_conversion_journey_filters() {
    let filters = PullFilters {
        campaign_ids: vec!["11".to_string()],
        tracker_ids: vec![],
        granularity: None,
    };
    let descriptor = SourceKind::ConversionJourney
        .descriptor("s".to_string(), "e".to_string(), &filters)
        .unwrap();
    let vars = descriptor.base_variables();
    assert_eq!(vars["campaignIds"], json!(["11"]));
    assert_eq!(vars["trackerIds"], json!([]));
    assert_eq!(vars[START_TIME_VARIABLE], "s");
    assert_eq!(vars[END_TIME_VARIABLE], "e");
}

#[test]
fn test_descriptor_advertiser_delivery_requires_granularity() {
    let err = SourceKind::AdvertiserDeliveryStats
        .descriptor("s".to_string(), "e".to_string(), &PullFilters::default())
        .unwrap_err();
    assert!(err.is_client_error());

    let filters = PullFilters {
        granularity: Some("daily".to_string()),
        ..Default::default()
    };
    let descriptor = SourceKind::AdvertiserDeliveryStats
        .descriptor("s".to_string(), "e".to_string(), &filters)
        .unwrap();
    assert_eq!(descriptor.base_variables()["granularity"], "DAILY");
}

// ============================================================================
// Pull Tests
// ============================================================================

#[tokio::test]
async fn test_pull_campaign_group_insights_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Authorization", "Bearer abc"))
        .and(body_partial_json(json!({
            "variables": {
                "startTime": "2024-01-01T00:00:00+0000",
                "endTime": "2024-01-04T00:00:00+0000",
                "first": 2,
                "after": null
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"campaignGroupInsight": {"records": {
                "totalCount": 3,
                "nodes": [
                    {"attributes": {"date": "2024-01-01"}, "campaignGroup": {"id": "1", "timezone": null}},
                    {"attributes": {"date": "2024-01-02"}, "campaignGroup": {"id": "1", "timezone": "UTC"}}
                ],
                "pageInfo": {"endCursor": "p1", "hasNextPage": true}
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"after": "p1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"campaignGroupInsight": {"records": {
                "totalCount": 3,
                "nodes": [
                    {"attributes": {"date": "2024-01-03"}, "campaignGroup": {"id": "2", "timezone": "UTC"}}
                ],
                "pageInfo": {"endCursor": "p2", "hasNextPage": false}
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PullRequest::new(
        SourceKind::CampaignGroupInsights,
        "Bearer abc",
        date("2024-01-01"),
        date("2024-01-03"),
    );
    let output = puller_for(&server, 3)
        .pull(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.records.len(), 3);
    assert_eq!(output.stats.pages, 2);
    assert_eq!(output.records[0]["attributes_date"], "2024-01-01");
    assert_eq!(output.records[0]["campaignGroup_timezone"], "");
    assert_eq!(output.records[2]["campaignGroup_id"], "2");
}

#[tokio::test]
async fn test_pull_conversion_journey_adds_offset_column() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": {"campaignIds": ["9"], "trackerIds": ["4", "5"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"conversionPath": {
                "totalCount": 1,
                "nodes": [{
                    "id": "cp1",
                    "conversionStats": {"conversionTime": "2024-05-01T08:00:00-0700", "device": "mobile"}
                }],
                "pageInfo": {"endCursor": "x", "hasNextPage": false}
            }}
        })))
        .mount(&server)
        .await;

    let request = PullRequest::new(
        SourceKind::ConversionJourney,
        "Bearer abc",
        date("2024-05-01"),
        date("2024-05-01"),
    )
    .with_filters(PullFilters {
        campaign_ids: vec!["9".to_string()],
        tracker_ids: vec!["4".to_string(), "5".to_string()],
        granularity: None,
    });

    let output = puller_for(&server, 3)
        .pull(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0]["timeDifferenceFromUTCinMins"], json!(-420));
    assert_eq!(output.records[0]["conversionStats_device"], "mobile");
}

#[tokio::test]
async fn test_pull_recovers_from_transient_upstream_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "temporarily unavailable"}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"campaignInsight": {"records": {
                "nodes": [{"campaign": {"id": "c"}}],
                "pageInfo": {"endCursor": null, "hasNextPage": false}
            }}}
        })))
        .mount(&server)
        .await;

    let request = PullRequest::new(
        SourceKind::CampaignInsights,
        "Bearer abc",
        date("2024-01-01"),
        date("2024-01-01"),
    );
    let output = puller_for(&server, 5)
        .pull(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.stats.retries, 2);
    assert_eq!(output.stats.requests, 3);
}

#[tokio::test]
async fn test_pull_fails_after_retry_bound() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"campaignInsight": {"__typename": "CampaignInsightError"}}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let request = PullRequest::new(
        SourceKind::CampaignInsights,
        "Bearer abc",
        date("2024-01-01"),
        date("2024-01-01"),
    );
    let err = puller_for(&server, 2)
        .pull(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MaxRetriesExceeded { .. }));
}

#[tokio::test]
async fn test_pull_rejects_bad_input_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let puller = puller_for(&server, 2);

    let inverted = PullRequest::new(
        SourceKind::CampaignInsights,
        "Bearer abc",
        date("2024-01-05"),
        date("2024-01-01"),
    );
    assert!(puller
        .pull(&inverted, &CancellationToken::new())
        .await
        .unwrap_err()
        .is_client_error());

    let no_granularity = PullRequest::new(
        SourceKind::AdvertiserDeliveryStats,
        "Bearer abc",
        date("2024-01-01"),
        date("2024-01-01"),
    );
    assert!(puller
        .pull(&no_granularity, &CancellationToken::new())
        .await
        .unwrap_err()
        .is_client_error());

    let zero_page = Puller::new(
        GraphqlClient::new(
            GraphqlClientConfig::builder()
                .endpoint(format!("{}/graphql", server.uri()))
                .build(),
        )
        .unwrap(),
        0,
        RetryPolicy::default(),
    );
    let valid = PullRequest::new(
        SourceKind::CampaignGroupInsights,
        "Bearer abc",
        date("2024-01-01"),
        date("2024-01-02"),
    );
    assert!(zero_page
        .pull(&valid, &CancellationToken::new())
        .await
        .unwrap_err()
        .is_client_error());
}
