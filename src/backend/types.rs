//! Backend auth types — sessions, users, events and errors.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the hosted auth backend or the client wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend response body could not be understood.
    #[error("unexpected auth response: {0}")]
    Parse(String),

    /// An operation needed a session and storage had none.
    #[error("Auth session missing!")]
    SessionMissing,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthError {
    /// Short user-facing message, suitable for a toast description.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// `true` when retrying later may succeed; such failures never discard a session.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { status: 429 | 500..=599, .. })
    }

    /// `true` for API rejections meaning the server-side session is already gone.
    #[must_use]
    pub(crate) fn session_already_gone(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403 | 404, .. })
    }
}

// =============================================================================
// USER / SESSION
// =============================================================================

/// The authenticated principal. Only the id and email are consumed here;
/// every other field the backend sends is dropped on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Email for log fields; `"-"` when absent.
    #[must_use]
    pub fn email_or_dash(&self) -> &str {
        self.email.as_deref().unwrap_or("-")
    }
}

/// A backend-issued session. Always carries its user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) after which the access token is invalid.
    pub expires_at: i64,
    /// Token lifetime in seconds as issued.
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl Session {
    /// `true` when the access token expires within `margin_secs` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin_secs: i64, now: i64) -> bool {
        self.expires_at - now <= margin_secs
    }
}

/// Current time as unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Result of a registration call. With email confirmation enabled the backend
/// returns only the user; with it disabled a session comes back too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub user: Option<User>,
    pub session: Option<Session>,
}

// =============================================================================
// EVENTS
// =============================================================================

/// Auth-state transitions published by a backend client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    TokenRefreshed,
    SignedOut,
}

impl AuthEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

/// One notification: the event plus the session it produced, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self { event: AuthEvent::SignedIn, session: Some(session) }
    }

    #[must_use]
    pub fn token_refreshed(session: Session) -> Self {
        Self { event: AuthEvent::TokenRefreshed, session: Some(session) }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { event: AuthEvent::SignedOut, session: None }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
