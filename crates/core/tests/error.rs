//! Error taxonomy tests.

use parley_core::ErrorKind;

#[test]
fn classify_by_substring() {
    assert_eq!(ErrorKind::classify("request timeout"), ErrorKind::Timeout);
    assert_eq!(ErrorKind::classify("operation timed out"), ErrorKind::Timeout);
    assert_eq!(ErrorKind::classify("The operation was aborted"), ErrorKind::Timeout);
    assert_eq!(ErrorKind::classify("Rate limit reached"), ErrorKind::RateLimit);
    assert_eq!(
        ErrorKind::classify("provider returned 429 Too Many Requests: {}"),
        ErrorKind::RateLimit
    );
    assert_eq!(ErrorKind::classify("insufficient quota"), ErrorKind::RateLimit);
    assert_eq!(ErrorKind::classify("401 Unauthorized"), ErrorKind::Auth);
    assert_eq!(ErrorKind::classify("authentication failed"), ErrorKind::Auth);
    assert_eq!(ErrorKind::classify("tcp connect error"), ErrorKind::Network);
    assert_eq!(ErrorKind::classify("failed to fetch"), ErrorKind::Network);
    assert_eq!(ErrorKind::classify("something else"), ErrorKind::Generic);
}

#[test]
fn forbidden_is_auth() {
    assert_eq!(
        ErrorKind::classify("provider returned 403 Forbidden: {\"error\":\"no access\"}"),
        ErrorKind::Auth
    );
    assert_eq!(ErrorKind::classify("Forbidden"), ErrorKind::Auth);
}

#[test]
fn timeout_wins_over_network() {
    assert_eq!(
        ErrorKind::classify("network request timed out"),
        ErrorKind::Timeout
    );
}

#[test]
fn classify_uses_context_chain() {
    let error = anyhow::anyhow!("connection reset").context("stream failed");
    assert_eq!(ErrorKind::of(&error), ErrorKind::Network);
}

#[test]
fn user_messages() {
    assert_eq!(
        ErrorKind::Timeout.user_message(),
        "The request timed out. Please try again with a shorter question."
    );
    assert_eq!(
        ErrorKind::Generic.user_message(),
        "An error occurred while processing your request."
    );
}
