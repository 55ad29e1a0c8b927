use super::*;

const USER_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

// =============================================================================
// parse_session
// =============================================================================

#[test]
fn parse_session_uses_backend_expires_at() {
    let json = format!(
        r#"{{"access_token":"a","refresh_token":"r","expires_in":3600,"expires_at":1700003600,
            "token_type":"bearer","user":{{"id":"{USER_ID}","email":"ada@example.com"}}}}"#
    );
    let session = parse_session(&json, 1_000).unwrap();
    assert_eq!(session.expires_at, 1_700_003_600);
    assert_eq!(session.expires_in, 3600);
    assert_eq!(session.user.id.to_string(), USER_ID);
    assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
}

#[test]
fn parse_session_computes_missing_expires_at() {
    let json = format!(r#"{{"access_token":"a","refresh_token":"r","expires_in":60,"user":{{"id":"{USER_ID}"}}}}"#);
    let session = parse_session(&json, 1_000).unwrap();
    assert_eq!(session.expires_at, 1_060);
    assert!(session.user.email.is_none());
}

#[test]
fn parse_session_without_user_is_parse_error() {
    let err = parse_session(r#"{"access_token":"a","refresh_token":"r"}"#, 0).unwrap_err();
    assert!(matches!(err, AuthError::Parse(_)));
}

// =============================================================================
// parse_sign_up
// =============================================================================

#[test]
fn parse_sign_up_bare_user_means_confirmation_pending() {
    let json = format!(r#"{{"id":"{USER_ID}","email":"ada@example.com","confirmation_sent_at":"2024-01-01T00:00:00Z"}}"#);
    let out = parse_sign_up(&json, 0).unwrap();
    assert!(out.session.is_none());
    assert_eq!(out.user.unwrap().email.as_deref(), Some("ada@example.com"));
}

#[test]
fn parse_sign_up_wrapped_user() {
    let json = format!(r#"{{"user":{{"id":"{USER_ID}"}},"session":null}}"#);
    let out = parse_sign_up(&json, 0).unwrap();
    assert!(out.session.is_none());
    assert!(out.user.is_some());
}

#[test]
fn parse_sign_up_autoconfirm_returns_session() {
    let json = format!(r#"{{"access_token":"a","refresh_token":"r","user":{{"id":"{USER_ID}"}}}}"#);
    let out = parse_sign_up(&json, 100).unwrap();
    let session = out.session.unwrap();
    assert_eq!(session.expires_at, 100 + 3600);
    assert_eq!(out.user, Some(session.user));
}

#[test]
fn parse_sign_up_garbage_is_parse_error() {
    assert!(matches!(parse_sign_up("[]", 0), Err(AuthError::Parse(_))));
}

// =============================================================================
// parse_error
// =============================================================================

#[test]
fn parse_error_reads_msg_field() {
    let err = parse_error(400, r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#);
    assert_eq!(err, AuthError::Api { status: 400, message: "Invalid login credentials".into() });
}

#[test]
fn parse_error_reads_legacy_oauth_shape() {
    let err = parse_error(400, r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Already Used"}"#);
    assert_eq!(err.message(), "Invalid Refresh Token: Already Used");
}

#[test]
fn parse_error_falls_back_to_text_then_status() {
    assert_eq!(parse_error(502, "Bad Gateway\n").message(), "Bad Gateway");
    assert_eq!(parse_error(500, "").message(), "HTTP 500");
}

// =============================================================================
// PKCE
// =============================================================================

#[test]
fn code_challenge_matches_rfc7636_vector() {
    assert_eq!(
        code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn code_verifier_is_64_hex_chars() {
    let verifier = generate_code_verifier();
    assert_eq!(verifier.len(), 64);
    assert!(verifier.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(verifier, generate_code_verifier());
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0aff");
}

// =============================================================================
// URLs
// =============================================================================

#[test]
fn endpoints_live_under_auth_v1() {
    let api = GoTrueApi::new("https://abc.supabase.co/", "anon".into(), ApiTimeouts::default()).unwrap();
    assert_eq!(
        api.endpoint("token", &[("grant_type", "password")]).as_str(),
        "https://abc.supabase.co/auth/v1/token?grant_type=password"
    );
    assert_eq!(api.endpoint("logout", &[]).as_str(), "https://abc.supabase.co/auth/v1/logout");
}

#[test]
fn redirect_query_is_encoded() {
    let api = GoTrueApi::new("https://abc.supabase.co", "anon".into(), ApiTimeouts::default()).unwrap();
    let url = api.endpoint("signup", &[("redirect_to", "http://localhost:3000/auth/callback")]);
    assert_eq!(
        url.as_str(),
        "https://abc.supabase.co/auth/v1/signup?redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"
    );
}

#[test]
fn invalid_project_url_is_rejected() {
    assert!(matches!(
        GoTrueApi::new("not a url", "anon".into(), ApiTimeouts::default()),
        Err(AuthError::HttpClientBuild(_))
    ));
}
