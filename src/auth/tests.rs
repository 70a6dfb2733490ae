//! Tests for the auth module

use super::*;
use base64::Engine;
use test_case::test_case;

fn basic(user: &str, pass: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
}

fn authenticator() -> Authenticator {
    Authenticator::new(vec![
        UserEntry::new("analyst", "s3cret"),
        UserEntry::new("partner", "p@ss:word").allow_route("/iMarketSolutions/conversionJourney"),
    ])
}

#[test]
fn test_parse_basic_header() {
    let creds = parse_basic_header(&basic("analyst", "s3cret")).unwrap();
    assert_eq!(creds.username, "analyst");
    assert_eq!(creds.password, "s3cret");
}

#[test]
fn test_parse_basic_header_password_with_colon() {
    let creds = parse_basic_header(&basic("partner", "p@ss:word")).unwrap();
    assert_eq!(creds.password, "p@ss:word");
}

#[test_case("" ; "empty")]
#[test_case("Bearer abc" ; "wrong scheme")]
#[test_case("Basic !!!" ; "not base64")]
#[test_case("Basic dXNlcm5hbWU=" ; "no colon")]
fn test_parse_basic_header_rejects(value: &str) {
    assert!(parse_basic_header(value).is_none());
}

#[test]
fn test_parse_basic_header_scheme_case_insensitive() {
    let header = basic("analyst", "s3cret").replacen("Basic", "basic", 1);
    assert!(parse_basic_header(&header).is_some());
}

#[test]
fn test_authorize_granted() {
    let decision = authenticator().authorize(Some(&basic("analyst", "s3cret")), "/campaignInsights");
    assert_eq!(
        decision,
        AuthDecision::Granted {
            username: "analyst".to_string()
        }
    );
}

#[test]
fn test_authorize_unauthorized() {
    let auth = authenticator();
    assert_eq!(auth.authorize(None, "/campaignInsights"), AuthDecision::Unauthorized);
    assert_eq!(
        auth.authorize(Some(&basic("analyst", "wrong")), "/campaignInsights"),
        AuthDecision::Unauthorized
    );
    assert_eq!(
        auth.authorize(Some(&basic("nobody", "s3cret")), "/campaignInsights"),
        AuthDecision::Unauthorized
    );
}

#[test]
fn test_authorize_restricted_user() {
    let auth = authenticator();
    let header = basic("partner", "p@ss:word");

    assert!(matches!(
        auth.authorize(Some(&header), "/iMarketSolutions/conversionJourney"),
        AuthDecision::Granted { .. }
    ));
    assert_eq!(
        auth.authorize(Some(&header), "/conversionJourney"),
        AuthDecision::Forbidden {
            username: "partner".to_string()
        }
    );
}

#[test]
fn test_bearer_credential() {
    assert_eq!(bearer_credential(" key-123 "), "Bearer key-123");
}

#[test]
fn test_user_entry_debug_hides_password() {
    let rendered = format!("{:?}", UserEntry::new("analyst", "s3cret"));
    assert!(!rendered.contains("s3cret"));
}
