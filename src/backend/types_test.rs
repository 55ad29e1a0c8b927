use super::*;

fn session(expires_at: i64) -> Session {
    Session {
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        expires_at,
        expires_in: 3600,
        token_type: "bearer".into(),
        user: User { id: Uuid::nil(), email: Some("ada@example.com".into()) },
    }
}

// =============================================================================
// AuthError
// =============================================================================

#[test]
fn network_and_server_errors_are_retryable() {
    assert!(AuthError::Network("connection reset".into()).retryable());
    assert!(AuthError::Api { status: 503, message: "unavailable".into() }.retryable());
    assert!(AuthError::Api { status: 429, message: "slow down".into() }.retryable());
}

#[test]
fn client_errors_are_not_retryable() {
    assert!(!AuthError::Api { status: 400, message: "Invalid Refresh Token".into() }.retryable());
    assert!(!AuthError::SessionMissing.retryable());
    assert!(!AuthError::Parse("eof".into()).retryable());
}

#[test]
fn api_error_displays_backend_message_only() {
    let err = AuthError::Api { status: 400, message: "Invalid login credentials".into() };
    assert_eq!(err.message(), "Invalid login credentials");
}

#[test]
fn session_gone_statuses() {
    for status in [401, 403, 404] {
        assert!(AuthError::Api { status, message: String::new() }.session_already_gone());
    }
    assert!(!AuthError::Api { status: 500, message: String::new() }.session_already_gone());
    assert!(!AuthError::Network(String::new()).session_already_gone());
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn expires_within_margin() {
    let s = session(1_000);
    assert!(s.expires_within(10, 995));
    assert!(s.expires_within(10, 990));
    assert!(!s.expires_within(10, 989));
    assert!(s.expires_within(10, 2_000));
}

#[test]
fn session_deserializes_with_backend_extras() {
    let json = r#"{
        "access_token": "a",
        "refresh_token": "r",
        "expires_at": 42,
        "user": {"id": "00000000-0000-0000-0000-000000000000", "email": "x@y.z", "aud": "authenticated"}
    }"#;
    let s: Session = serde_json::from_str(json).unwrap();
    assert_eq!(s.token_type, "bearer");
    assert_eq!(s.expires_in, 0);
    assert_eq!(s.user.email.as_deref(), Some("x@y.z"));
}

#[test]
fn user_without_email_logs_dash() {
    let user = User { id: Uuid::nil(), email: None };
    assert_eq!(user.email_or_dash(), "-");
}

// =============================================================================
// AuthChange
// =============================================================================

#[test]
fn change_constructors_pair_event_and_session() {
    let s = session(1);
    assert_eq!(AuthChange::signed_in(s.clone()).event, AuthEvent::SignedIn);
    assert_eq!(AuthChange::token_refreshed(s.clone()).session, Some(s));
    assert!(AuthChange::signed_out().session.is_none());
}

#[test]
fn event_wire_names() {
    assert_eq!(AuthEvent::SignedIn.as_str(), "SIGNED_IN");
    assert_eq!(AuthEvent::TokenRefreshed.as_str(), "TOKEN_REFRESHED");
    assert_eq!(AuthEvent::SignedOut.as_str(), "SIGNED_OUT");
}
