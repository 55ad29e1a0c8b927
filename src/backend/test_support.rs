//! Scripted `AuthApi` and session fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use super::gotrue::{AuthApi, SignUpRequest};
use super::types::{AuthError, Session, SignUp, User, unix_now};

pub const TEST_STORAGE_KEY: &str = "sb-test-auth-token";

/// A session for `email` expiring `ttl_secs` from now. Tokens are unique.
pub fn session_for(email: &str, ttl_secs: i64) -> Session {
    let tag = Uuid::new_v4();
    Session {
        access_token: format!("access-{tag}"),
        refresh_token: format!("refresh-{tag}"),
        expires_at: unix_now() + ttl_secs,
        expires_in: ttl_secs,
        token_type: "bearer".into(),
        user: User { id: Uuid::new_v4(), email: Some(email.to_owned()) },
    }
}

pub fn fresh_session() -> Session {
    session_for("ada@example.com", 3600)
}

/// Inside the client's refresh margin.
pub fn expiring_session() -> Session {
    session_for("ada@example.com", 5)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSignUp {
    pub email: String,
    pub email_redirect_to: Option<String>,
    pub code_challenge: Option<String>,
}

/// Pops scripted results per endpoint; falls back to success when a script
/// runs dry.
#[derive(Default)]
pub struct MockApi {
    password: Mutex<VecDeque<Result<Session, AuthError>>>,
    refresh: Mutex<VecDeque<Result<Session, AuthError>>>,
    pkce: Mutex<VecDeque<Result<Session, AuthError>>>,
    sign_up: Mutex<VecDeque<Result<SignUp, AuthError>>>,
    logout: Mutex<VecDeque<Result<(), AuthError>>>,
    calls: Mutex<Vec<&'static str>>,
    pub refresh_delay: Option<Duration>,
    pub last_verifier: Mutex<Option<Option<String>>>,
    pub last_sign_up: Mutex<Option<RecordedSignUp>>,
    pub last_refresh_token: Mutex<Option<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_delay(delay: Duration) -> Self {
        Self { refresh_delay: Some(delay), ..Self::default() }
    }

    pub fn push_password(&self, result: Result<Session, AuthError>) {
        self.password.lock().unwrap().push_back(result);
    }

    pub fn push_refresh(&self, result: Result<Session, AuthError>) {
        self.refresh.lock().unwrap().push_back(result);
    }

    pub fn push_pkce(&self, result: Result<Session, AuthError>) {
        self.pkce.lock().unwrap().push_back(result);
    }

    pub fn push_sign_up(&self, result: Result<SignUp, AuthError>) {
        self.sign_up.lock().unwrap().push_back(result);
    }

    pub fn push_logout(&self, result: Result<(), AuthError>) {
        self.logout.lock().unwrap().push_back(result);
    }

    /// How many times `endpoint` was called.
    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }
}

#[async_trait::async_trait]
impl AuthApi for MockApi {
    async fn password_grant(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
        self.record("password");
        let scripted = self.password.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(session_for(email, 3600)))
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.record("refresh");
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_owned());
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.refresh.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(fresh_session()))
    }

    async fn pkce_grant(&self, _auth_code: &str, code_verifier: Option<&str>) -> Result<Session, AuthError> {
        self.record("pkce");
        *self.last_verifier.lock().unwrap() = Some(code_verifier.map(str::to_owned));
        let scripted = self.pkce.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(fresh_session()))
    }

    async fn sign_up(&self, request: SignUpRequest<'_>) -> Result<SignUp, AuthError> {
        self.record("sign_up");
        *self.last_sign_up.lock().unwrap() = Some(RecordedSignUp {
            email: request.email.to_owned(),
            email_redirect_to: request.email_redirect_to.map(str::to_owned),
            code_challenge: request.code_challenge.map(str::to_owned),
        });
        let scripted = self.sign_up.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(SignUp { user: Some(User { id: Uuid::new_v4(), email: Some(request.email.to_owned()) }), session: None })
        })
    }

    async fn logout(&self, _access_token: &str) -> Result<(), AuthError> {
        self.record("logout");
        let scripted = self.logout.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(()))
    }
}
