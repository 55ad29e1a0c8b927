//! Stateful auth client — the session-owning side of the backend.
//!
//! ARCHITECTURE
//! ============
//! `GoTrueClient` pairs the stateless HTTP API with a storage adapter and an
//! observer registry. Every operation that changes the stored session also
//! publishes an `AuthChange`, so subscribers never have to poll.
//!
//! TRADE-OFFS
//! ==========
//! Refreshes are serialized per client behind an async mutex, and storage is
//! re-read once the mutex is held: concurrent `get_session` calls on an
//! expiring session perform one refresh. Two different clients (say, the
//! request guard and a long-lived in-process client) share no lock; the
//! newest token pair written to storage wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use super::events::{AuthObserver, ObserverRegistry, Subscription};
use super::gotrue::{AuthApi, SignUpRequest, code_challenge, generate_code_verifier};
use super::storage::StorageAdapter;
use super::types::{AuthChange, AuthError, Session, SignUp, unix_now};

/// Refresh when the access token has this many seconds or fewer left.
pub const EXPIRY_MARGIN_SECS: i64 = 10;
/// Auto-refresh wakes this often.
pub const AUTO_REFRESH_TICK_SECS: u64 = 30;
/// Auto-refresh acts when expiry is within this many ticks.
pub const AUTO_REFRESH_TICK_THRESHOLD: i64 = 3;

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// The backend auth client as the rest of the application sees it.
#[async_trait::async_trait]
pub trait AuthClient: Send + Sync {
    /// Current session, refreshed first if it is about to expire.
    ///
    /// # Errors
    ///
    /// Returns an error if a needed refresh fails.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Credential check. Publishes `SignedIn` on success.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Registration. The confirmation link points at `email_redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error.
    async fn sign_up(&self, email: &str, password: &str, email_redirect_to: Option<&str>)
    -> Result<SignUp, AuthError>;

    /// Revoke and forget the current session. Publishes `SignedOut`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refused for a reason other than the
    /// session already being gone; the local session is kept in that case.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Trade the refresh token for a new pair. Publishes `TokenRefreshed`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionMissing`] without a session, or the
    /// backend's rejection.
    async fn refresh_session(&self) -> Result<Session, AuthError>;

    /// Complete an email-link or OAuth flow. Publishes `SignedIn`.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError>;

    /// Register an observer for every subsequent auth change.
    fn on_auth_state_change(&self, observer: Arc<dyn AuthObserver>) -> Subscription;
}

// =============================================================================
// GOTRUE CLIENT
// =============================================================================

pub struct GoTrueClient {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn StorageAdapter>,
    storage_key: String,
    events: ObserverRegistry,
    refresh_lock: AsyncMutex<()>,
}

impl GoTrueClient {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn StorageAdapter>, storage_key: impl Into<String>) -> Self {
        Self {
            api,
            storage,
            storage_key: storage_key.into(),
            events: ObserverRegistry::new(),
            refresh_lock: AsyncMutex::new(()),
        }
    }

    fn verifier_key(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    /// Session currently in storage, without any refresh. Corrupt entries
    /// are removed and read as absent.
    #[must_use]
    pub fn stored_session(&self) -> Option<Session> {
        let raw = self.storage.get_item(&self.storage_key)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                self.storage.remove_item(&self.storage_key);
                None
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_string(session).map_err(|e| AuthError::Parse(e.to_string()))?;
        self.storage.set_item(&self.storage_key, &json);
        Ok(())
    }

    fn remove_session(&self) {
        self.storage.remove_item(&self.storage_key);
        self.storage.remove_item(&self.verifier_key());
    }

    /// Refresh `stale` unless another caller already replaced it.
    async fn refresh_if_stale(&self, stale: &Session, margin_secs: i64) -> Result<Option<Session>, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.stored_session();
        match current {
            Some(current) if current.access_token != stale.access_token => return Ok(Some(current)),
            Some(current) if !current.expires_within(margin_secs, unix_now()) => return Ok(Some(current)),
            Some(_) => {}
            None => return Ok(None),
        }

        self.call_refresh(&stale.refresh_token).await.map(Some)
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        match self.api.refresh_grant(refresh_token).await {
            Ok(session) => {
                self.save_session(&session)?;
                tracing::debug!(user = session.user.email_or_dash(), "token refreshed");
                self.events.emit(&AuthChange::token_refreshed(session.clone()));
                Ok(session)
            }
            Err(e) if e.retryable() => {
                tracing::warn!(error = %e, "token refresh failed, keeping session");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh token rejected, removing session");
                self.remove_session();
                self.events.emit(&AuthChange::signed_out());
                Err(e)
            }
        }
    }

    fn adopt_session(&self, session: &Session) -> Result<(), AuthError> {
        self.save_session(session)?;
        self.events.emit(&AuthChange::signed_in(session.clone()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthClient for GoTrueClient {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.stored_session() else {
            return Ok(None);
        };
        if !session.expires_within(EXPIRY_MARGIN_SECS, unix_now()) {
            return Ok(Some(session));
        }
        self.refresh_if_stale(&session, EXPIRY_MARGIN_SECS).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.api.password_grant(email, password).await?;
        self.storage.remove_item(&self.verifier_key());
        self.adopt_session(&session)?;
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<SignUp, AuthError> {
        let verifier = generate_code_verifier();
        let challenge = code_challenge(&verifier);
        self.storage.set_item(&self.verifier_key(), &verifier);

        let request = SignUpRequest { email, password, email_redirect_to, code_challenge: Some(&challenge) };
        let outcome = self.api.sign_up(request).await?;
        if let Some(session) = &outcome.session {
            self.storage.remove_item(&self.verifier_key());
            self.adopt_session(session)?;
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.stored_session() {
            match self.api.logout(&session.access_token).await {
                Ok(()) => {}
                Err(e) if e.session_already_gone() => {
                    tracing::debug!(error = %e, "server session already gone");
                }
                Err(e) => return Err(e),
            }
        }
        self.remove_session();
        self.events.emit(&AuthChange::signed_out());
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let _guard = self.refresh_lock.lock().await;
        let session = self.stored_session().ok_or(AuthError::SessionMissing)?;
        self.call_refresh(&session.refresh_token).await
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = self.storage.get_item(&self.verifier_key());
        let session = self.api.pkce_grant(code, verifier.as_deref()).await?;
        self.storage.remove_item(&self.verifier_key());
        self.adopt_session(&session)?;
        Ok(session)
    }

    fn on_auth_state_change(&self, observer: Arc<dyn AuthObserver>) -> Subscription {
        self.events.subscribe(observer)
    }
}

// =============================================================================
// AUTO REFRESH
// =============================================================================

/// Spawn the background refresh ticker for a long-lived client. Returns a
/// handle for shutdown.
pub fn spawn_auto_refresh(client: Arc<GoTrueClient>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(AUTO_REFRESH_TICK_SECS));
        loop {
            interval.tick().await;
            auto_refresh_tick(&client).await;
        }
    })
}

#[allow(clippy::cast_possible_wrap)]
async fn auto_refresh_tick(client: &GoTrueClient) {
    let Some(session) = client.stored_session() else {
        return;
    };
    let margin = AUTO_REFRESH_TICK_THRESHOLD * AUTO_REFRESH_TICK_SECS as i64;
    if !session.expires_within(margin, unix_now()) {
        return;
    }
    if let Err(e) = client.refresh_if_stale(&session, margin).await {
        tracing::warn!(error = %e, "auto refresh failed");
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
