use super::*;
use test_case::test_case;

fn headers_of(auth: &AuthConfig) -> reqwest::header::HeaderMap {
    let req = reqwest::Client::new().get("https://example.com/api/v2/");
    auth.apply(req).build().unwrap().headers().clone()
}

#[test]
fn test_anonymous_requests_carry_no_token() {
    let auth = AuthConfig::default();

    assert_eq!(auth, AuthConfig::None);
    assert!(!auth.is_configured());
    assert!(headers_of(&auth).get(DEFAULT_API_KEY_HEADER).is_none());
}

#[test_case(AuthConfig::osdi("secret-token"), DEFAULT_API_KEY_HEADER ; "osdi header")]
#[test_case(AuthConfig::api_key_header("X-Api-Key", "secret-token"), "X-Api-Key" ; "custom header")]
fn test_token_header(auth: AuthConfig, header: &str) {
    let headers = headers_of(&auth);

    assert!(auth.is_configured());
    assert_eq!(headers.get(header).unwrap(), "secret-token");
}

#[test]
fn test_debug_redacts_token() {
    let rendered = format!("{:?}", AuthConfig::osdi("secret-token"));

    assert!(rendered.contains(DEFAULT_API_KEY_HEADER));
    assert!(!rendered.contains("secret-token"));
}
