use super::*;

#[test]
fn test_parse_api_error_with_json_body() {
    let error_json = r#"{"error": {"type": "invalid_request_error", "message": "bad request"}}"#;
    match ProviderErrorHandler::parse_api_error(400, error_json) {
        RelayError::Provider { message, retryable } => {
            assert!(message.contains("invalid_request_error"));
            assert!(message.contains("bad request"));
            assert!(!retryable);
        }
        err => panic!("expected Provider error, got {:?}", err),
    }
}

#[test]
fn test_parse_api_error_5xx_retryable() {
    for status in [500, 502, 503, 504] {
        let err = ProviderErrorHandler::parse_api_error(status, r#"{"error": {"message": "busy"}}"#);
        assert!(err.is_retryable(), "status {} should be retryable", status);
    }
}

#[test]
fn test_parse_api_error_4xx_not_retryable() {
    let err = ProviderErrorHandler::parse_api_error(404, r#"{"error": {"message": "no model"}}"#);
    assert!(!err.is_retryable());
}

#[test]
fn test_parse_api_error_non_json_body() {
    match ProviderErrorHandler::parse_api_error(502, "<html>Bad Gateway</html>") {
        RelayError::Provider { message, retryable } => {
            assert!(message.contains("502"));
            assert!(message.contains("Bad Gateway"));
            assert!(retryable);
        }
        err => panic!("expected Provider error, got {:?}", err),
    }
}

#[test]
fn test_parse_api_error_quota_not_retryable() {
    let body = r#"{"error": {"code": "insufficient_quota", "message": "You exceeded your quota"}}"#;
    match ProviderErrorHandler::parse_api_error(429, body) {
        RelayError::Provider { message, retryable } => {
            assert!(message.contains("quota"));
            assert!(!retryable);
        }
        err => panic!("expected Provider error, got {:?}", err),
    }
}

#[test]
fn test_handle_rate_limit_with_retry_after() {
    match ProviderErrorHandler::handle_rate_limit(429, Some(30)) {
        RelayError::RateLimit { retry_after } => assert_eq!(retry_after, Some(30)),
        err => panic!("expected RateLimit error, got {:?}", err),
    }
}

#[test]
fn test_handle_auth_error() {
    match ProviderErrorHandler::handle_auth_error(401, "invalid token") {
        RelayError::Auth(msg) => {
            assert!(msg.contains("invalid token"));
            assert!(msg.contains("Authentication failed"));
        }
        err => panic!("expected Auth error, got {:?}", err),
    }
}

#[derive(Debug)]
struct Leaf;

impl std::fmt::Display for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection reset by peer")
    }
}

impl std::error::Error for Leaf {}

#[derive(Debug)]
struct Outer(Leaf);

impl std::fmt::Display for Outer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error sending request")
    }
}

impl std::error::Error for Outer {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn test_error_chain_includes_sources() {
    let chain = error_chain(&Outer(Leaf));
    assert_eq!(chain, "error sending request: connection reset by peer");
}
