//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the parsed config and the stateless auth API. Session state never
//! lives here: every request builds its own `GoTrueClient` over the request's
//! cookie jar, so concurrent users never share a session.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;

use crate::backend::{AuthApi, CookieStorage, GoTrueClient};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_api: Arc<dyn AuthApi>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, auth_api: Arc<dyn AuthApi>) -> Self {
        Self { config: Arc::new(config), auth_api }
    }

    /// Request-scoped auth client reading and writing session cookies in
    /// `jar`. Read the updated jar back from the returned storage.
    #[must_use]
    pub fn request_client(&self, jar: CookieJar) -> (GoTrueClient, Arc<CookieStorage>) {
        let storage = Arc::new(CookieStorage::new(jar, self.config.cookie_secure));
        let client = GoTrueClient::new(Arc::clone(&self.auth_api), storage.clone(), self.config.storage_key.clone());
        (client, storage)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
