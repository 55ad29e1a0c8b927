//! Hosted auth API client (GoTrue-compatible, as served by Supabase).
//!
//! Thin HTTP wrapper for `/auth/v1`. Stateless: it never stores a session.
//! Pure parsing in `parse_session`, `parse_sign_up` and `parse_error` for
//! testability.

use std::fmt::Write;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::types::{AuthError, Session, SignUp, User, unix_now};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// =============================================================================
// API TRAIT
// =============================================================================

/// Registration parameters.
#[derive(Debug, Clone, Copy)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Where the confirmation link should send the user.
    pub email_redirect_to: Option<&'a str>,
    /// S256 PKCE challenge; the verifier stays with the caller.
    pub code_challenge: Option<&'a str>,
}

/// The hosted auth endpoints this application uses. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /token?grant_type=password`.
    async fn password_grant(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// `POST /token?grant_type=refresh_token`.
    async fn refresh_grant(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// `POST /token?grant_type=pkce`.
    async fn pkce_grant(&self, auth_code: &str, code_verifier: Option<&str>) -> Result<Session, AuthError>;

    /// `POST /signup`.
    async fn sign_up(&self, request: SignUpRequest<'_>) -> Result<SignUp, AuthError>;

    /// `POST /logout`, revoking the refresh tokens behind `access_token`.
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

pub struct GoTrueApi {
    http: reqwest::Client,
    base_url: url::Url,
    anon_key: String,
}

impl GoTrueApi {
    /// Build a client for the project at `project_url` (the auth API lives at
    /// `<project_url>/auth/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client fails to build.
    pub fn new(project_url: &str, anon_key: String, timeouts: ApiTimeouts) -> Result<Self, AuthError> {
        let base_url = auth_base_url(project_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, anon_key })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> url::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    async fn post(
        &self,
        url: url::Url,
        bearer: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<String, AuthError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        Ok(text)
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let url = self.endpoint("token", &[("grant_type", grant_type)]);
        let text = self.post(url, None, &body).await?;
        parse_session(&text, unix_now())
    }
}

#[async_trait::async_trait]
impl AuthApi for GoTrueApi {
    async fn password_grant(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.token("password", serde_json::json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.token("refresh_token", serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn pkce_grant(&self, auth_code: &str, code_verifier: Option<&str>) -> Result<Session, AuthError> {
        self.token("pkce", serde_json::json!({ "auth_code": auth_code, "code_verifier": code_verifier }))
            .await
    }

    async fn sign_up(&self, request: SignUpRequest<'_>) -> Result<SignUp, AuthError> {
        let query: Vec<(&str, &str)> = request
            .email_redirect_to
            .map(|to| vec![("redirect_to", to)])
            .unwrap_or_default();
        let url = self.endpoint("signup", &query);
        let mut body = serde_json::json!({ "email": request.email, "password": request.password });
        if let Some(challenge) = request.code_challenge {
            body["code_challenge"] = challenge.into();
            body["code_challenge_method"] = "s256".into();
        }
        let text = self.post(url, None, &body).await?;
        parse_sign_up(&text, unix_now())
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("logout", &[("scope", "global")]);
        self.post(url, Some(access_token), &serde_json::json!({}))
            .await
            .map(|_| ())
    }
}

fn auth_base_url(project_url: &str) -> Result<url::Url, AuthError> {
    let trimmed = project_url.trim_end_matches('/');
    url::Url::parse(&format!("{trimmed}/auth/v1/"))
        .map_err(|e| AuthError::HttpClientBuild(format!("invalid auth url {project_url:?}: {e}")))
}

// =============================================================================
// PKCE
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 64-character PKCE code verifier.
#[must_use]
pub fn generate_code_verifier() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// S256 challenge for a verifier: base64url(sha256(verifier)), unpadded.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at.unwrap_or(now + expires_in),
            expires_in,
            token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
            user: self.user,
        }
    }
}

pub(crate) fn parse_session(json: &str, now: i64) -> Result<Session, AuthError> {
    serde_json::from_str::<TokenResponse>(json)
        .map(|resp| resp.into_session(now))
        .map_err(|e| AuthError::Parse(e.to_string()))
}

#[derive(Deserialize)]
struct WrappedUser {
    user: User,
}

/// Sign-up answers with a full token response when confirmation is off, or
/// with the bare user (sometimes wrapped in `{"user": ...}`) when it is on.
pub(crate) fn parse_sign_up(json: &str, now: i64) -> Result<SignUp, AuthError> {
    if let Ok(resp) = serde_json::from_str::<TokenResponse>(json) {
        let session = resp.into_session(now);
        return Ok(SignUp { user: Some(session.user.clone()), session: Some(session) });
    }
    if let Ok(user) = serde_json::from_str::<User>(json) {
        return Ok(SignUp { user: Some(user), session: None });
    }
    serde_json::from_str::<WrappedUser>(json)
        .map(|wrapped| SignUp { user: Some(wrapped.user), session: None })
        .map_err(|e| AuthError::Parse(e.to_string()))
}

/// Pull a human message out of any of the error shapes the API has used.
pub(crate) fn parse_error(status: u16, body: &str) -> AuthError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|field| value.get(field).and_then(|v| v.as_str()).map(str::to_owned))
        });
    let message = from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| format!("HTTP {status}"));
    AuthError::Api { status, message }
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
