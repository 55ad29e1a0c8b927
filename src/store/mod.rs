//! Session store — client-side auth state with reactive snapshots.
//!
//! DESIGN
//! ======
//! A `SessionScope` provisions one `SessionStore` per application root. The
//! store subscribes to the auth client's change events, resolves the startup
//! session in a background task, and exposes `{user, session, loading}`
//! through a `tokio::sync::watch` channel.
//!
//! Every applied change bumps an event sequence number under the channel's
//! write lock. The startup read captures the sequence before it starts and
//! only lands if nothing happened in between, so a late `get_session`
//! result can never overwrite a newer sign-in or sign-out.
//!
//! After each change the store re-checks the current location: protected
//! pages bounce signed-out visitors to login (remembering where they were),
//! auth-only pages bounce signed-in visitors to the remembered page or the
//! dashboard.

pub mod ports;
pub mod protected;
pub mod redirect;
pub mod toast;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{
    AuthChange, AuthClient, AuthError, AuthEvent, AuthObserver, GoTrueClient, Session, StorageAdapter, Subscription,
    User, spawn_auto_refresh,
};
use crate::paths::{CALLBACK_PATH, DASHBOARD_PATH, HOME_PATH, LOGIN_PATH, RouteClass, canonical_path, classify};

pub use ports::{History, Navigator, Notifier, Toast, ToastVariant};
pub use protected::{Guarded, ProtectedRoute};
pub use toast::ToastQueue;

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup session read still in flight.
    Uninitialized,
    Unauthenticated,
    Authenticated,
}

/// Point-in-time view of the auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub loading: bool,
}

impl AuthSnapshot {
    fn initial() -> Self {
        Self { user: None, session: None, loading: true }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match (self.loading, &self.user) {
            (true, _) => AuthPhase::Uninitialized,
            (false, None) => AuthPhase::Unauthenticated,
            (false, Some(_)) => AuthPhase::Authenticated,
        }
    }

    fn apply(&mut self, session: Option<Session>) {
        self.user = session.as_ref().map(|s| s.user.clone());
        self.session = session;
        self.loading = false;
    }
}

/// Host dependencies injected into the store.
#[derive(Clone)]
pub struct StorePorts {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    /// Session-scoped storage holding the redirect intent.
    pub session_storage: Arc<dyn StorageAdapter>,
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    client: Arc<dyn AuthClient>,
    ports: StorePorts,
    state: watch::Sender<AuthSnapshot>,
    sequence: AtomicU64,
    destroyed: AtomicBool,
}

impl SessionStore {
    fn new(client: Arc<dyn AuthClient>, ports: StorePorts) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::initial());
        Self { client, ports, state, sequence: AtomicU64::new(0), destroyed: AtomicBool::new(false) }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Resolves once the startup read (or any auth event) has settled the
    /// state.
    pub async fn loaded(&self) -> AuthSnapshot {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|snapshot| !snapshot.loading).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    // -------------------------------------------------------------------------
    // Startup
    // -------------------------------------------------------------------------

    /// Read the current session and publish it, unless an auth event landed
    /// first.
    async fn initialize(&self) {
        let seen = self.sequence.load(Ordering::SeqCst);
        let result = self.client.get_session().await;
        if self.is_destroyed() {
            return;
        }

        let applied = self.state.send_if_modified(|snapshot| {
            if self.sequence.load(Ordering::SeqCst) != seen {
                debug!("startup session read superseded by auth event");
                return false;
            }
            match result {
                Ok(session) => snapshot.apply(session),
                Err(e) => {
                    warn!(error = %e, "initial session read failed");
                    snapshot.apply(None);
                }
            }
            true
        });
        if applied {
            self.check_route();
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the auth service's rejection; an error toast has already been
    /// shown.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.client.sign_in_with_password(email, password).await {
            Ok(_) => {
                info!(email, "signed in");
                self.ports
                    .notifier
                    .notify(Toast::info("Success!", "You have been logged in."));
                Ok(())
            }
            Err(e) => {
                warn!(email, error = %e, "sign in failed");
                self.ports.notifier.notify(Toast::error(&e.message()));
                Err(e)
            }
        }
    }

    /// Register and ask the service to send a verification email that lands
    /// on this site's callback path.
    ///
    /// # Errors
    ///
    /// Returns the auth service's rejection; an error toast has already been
    /// shown.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let callback = format!("{}{CALLBACK_PATH}", self.ports.navigator.origin());
        match self.client.sign_up(email, password, Some(&callback)).await {
            Ok(_) => {
                info!(email, "signed up");
                self.ports.notifier.notify(Toast::info(
                    "Success!",
                    "Please check your email to verify your account.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(email, error = %e, "sign up failed");
                self.ports.notifier.notify(Toast::error(&e.message()));
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the auth service's error. Local state is left untouched.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.client.sign_out().await {
            Ok(()) => {
                redirect::clear(self.ports.session_storage.as_ref());
                self.go_home();
                self.ports
                    .notifier
                    .notify(Toast::info("Signed out", "You have been signed out successfully."));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sign out failed");
                self.ports.notifier.notify(Toast::error(&e.message()));
                Err(e)
            }
        }
    }

    /// Refresh the session and replace user + session in one publish.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure. Failures are logged, never toasted, and
    /// leave the published state alone.
    pub async fn refresh_token(&self) -> Result<(), AuthError> {
        match self.client.refresh_session().await {
            Ok(session) => {
                self.publish(Some(session));
                self.check_route();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                Err(e)
            }
        }
    }

    /// Client-side navigation. Re-applies the route rules at the new location.
    pub fn navigate(&self, path: &str) {
        self.ports.navigator.push(path);
        self.check_route();
    }

    /// Honor a `redirectTo` value handed to the login page by the server
    /// guard. Only local paths are accepted.
    pub fn adopt_redirect_param(&self, raw: &str) -> bool {
        redirect::remember(self.ports.session_storage.as_ref(), raw)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn publish(&self, session: Option<Session>) {
        self.state.send_modify(|snapshot| {
            self.sequence.fetch_add(1, Ordering::SeqCst);
            snapshot.apply(session);
        });
    }

    fn apply_change(&self, change: &AuthChange) {
        if self.is_destroyed() {
            return;
        }
        debug!(event = change.event.as_str(), "auth change");

        let navigator = &self.ports.navigator;
        let storage = self.ports.session_storage.as_ref();
        match change.event {
            AuthEvent::SignedIn => {
                self.publish(change.session.clone());
                navigator.refresh();
                if let Some(target) = redirect::take(storage) {
                    navigator.push(&target);
                }
            }
            AuthEvent::TokenRefreshed => {
                self.publish(change.session.clone());
                navigator.refresh();
            }
            AuthEvent::SignedOut => {
                self.publish(None);
                redirect::clear(storage);
                navigator.refresh();
                self.go_home();
            }
        }
        self.check_route();
    }

    /// Navigate to the landing page unless already there.
    fn go_home(&self) {
        let navigator = &self.ports.navigator;
        if current_route(&navigator.current_path()) != HOME_PATH {
            navigator.push(HOME_PATH);
        }
    }

    /// Send a signed-out visitor to login, remembering where they were.
    fn redirect_to_login(&self) {
        let navigator = &self.ports.navigator;
        let location = navigator.current_path();
        let path = current_route(&location);
        if classify(&path) == RouteClass::AuthOnly {
            return;
        }
        redirect::remember(self.ports.session_storage.as_ref(), &path);
        navigator.push(LOGIN_PATH);
    }

    /// Apply the client-side route rules at the current location.
    fn check_route(&self) {
        let signed_in = {
            let snapshot = self.state.borrow();
            if snapshot.loading {
                return;
            }
            snapshot.user.is_some()
        };

        let navigator = &self.ports.navigator;
        let storage = self.ports.session_storage.as_ref();
        let location = navigator.current_path();
        let path = current_route(&location);

        match classify(&path) {
            RouteClass::Protected if !signed_in => {
                redirect::remember(storage, &path);
                navigator.push(LOGIN_PATH);
            }
            RouteClass::AuthOnly if signed_in => {
                let target = redirect::take(storage).unwrap_or_else(|| DASHBOARD_PATH.to_owned());
                navigator.push(&target);
            }
            _ => {}
        }
    }
}

/// Canonical path of a navigator location, without query or fragment.
fn current_route(location: &str) -> String {
    canonical_path(location.split(['?', '#']).next().unwrap_or(HOME_PATH))
}

struct StoreObserver(Weak<SessionStore>);

impl AuthObserver for StoreObserver {
    fn on_auth_change(&self, change: &AuthChange) {
        if let Some(store) = self.0.upgrade() {
            store.apply_change(change);
        }
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// Owns a store for the lifetime of an application root. Dropping the scope
/// unsubscribes from auth events and cancels the startup read and the
/// auto-refresh ticker.
pub struct SessionScope {
    store: Arc<SessionStore>,
    subscription: Option<Subscription>,
    startup: Option<JoinHandle<()>>,
    auto_refresh: Option<JoinHandle<()>>,
}

impl SessionScope {
    /// Create the store, subscribe it to `client`, and start resolving the
    /// current session. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn provision(client: Arc<dyn AuthClient>, ports: StorePorts) -> Self {
        let store = Arc::new(SessionStore::new(Arc::clone(&client), ports));
        let subscription = client.on_auth_state_change(Arc::new(StoreObserver(Arc::downgrade(&store))));
        let startup = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.initialize().await }
        });
        Self { store, subscription: Some(subscription), startup: Some(startup), auto_refresh: None }
    }

    /// `provision`, plus the background token refresh ticker for a
    /// long-lived client. The ticker runs until the scope is torn down.
    #[must_use]
    pub fn provision_with_auto_refresh(client: Arc<GoTrueClient>, ports: StorePorts) -> Self {
        let ticker = spawn_auto_refresh(Arc::clone(&client));
        let mut scope = Self::provision(client, ports);
        scope.auto_refresh = Some(ticker);
        scope
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Weak accessor for components rendered inside this scope.
    #[must_use]
    pub fn handle(&self) -> StoreHandle {
        StoreHandle(Arc::downgrade(&self.store))
    }

    /// Wait for the startup session read to finish.
    pub async fn startup_finished(&mut self) {
        if let Some(startup) = self.startup.take()
            && let Err(e) = startup.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "session startup task failed");
        }
    }

    pub fn teardown(self) {}
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        self.store.destroyed.store(true, Ordering::SeqCst);
        self.subscription.take();
        for task in [self.startup.take(), self.auto_refresh.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

/// Cloneable reference to a scope's store.
#[derive(Clone)]
pub struct StoreHandle(Weak<SessionStore>);

impl StoreHandle {
    /// `None` once the owning scope has been torn down.
    #[must_use]
    pub fn try_store(&self) -> Option<Arc<SessionStore>> {
        self.0.upgrade().filter(|store| !store.is_destroyed())
    }

    /// # Panics
    ///
    /// Panics when used after the owning `SessionScope` is gone. Components
    /// must not outlive the root that provisioned them.
    #[must_use]
    pub fn store(&self) -> Arc<SessionStore> {
        match self.try_store() {
            Some(store) => store,
            None => panic!("session store used outside its provisioning scope"),
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
