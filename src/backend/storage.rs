//! Session storage adapters for the stateful auth client.
//!
//! ARCHITECTURE
//! ============
//! The client stores its session as a JSON string under one key. In-process
//! clients keep it in memory; request-scoped server clients keep it in the
//! request's cookies and accumulate any writes in the same `CookieJar`, which
//! the caller attaches to whatever response it returns.
//!
//! Cookie values are `base64-` + base64url(JSON), the same encoding the
//! hosted SDK uses, so both sides of the site can read each other's cookies.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::Duration;

const BASE64_PREFIX: &str = "base64-";
const COOKIE_MAX_AGE_DAYS: i64 = 400;

/// String key-value storage the client persists its session through.
pub trait StorageAdapter: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Used by long-lived in-process clients.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&self, key: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// =============================================================================
// COOKIES
// =============================================================================

/// Request-scoped storage over the request's cookies.
///
/// Reads see the incoming cookies plus any writes made since. Writes are
/// recorded as jar deltas; [`CookieStorage::jar`] hands them back so the
/// caller can emit `Set-Cookie` on its response.
#[derive(Debug)]
pub struct CookieStorage {
    jar: Mutex<CookieJar>,
    secure: bool,
}

impl CookieStorage {
    #[must_use]
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar: Mutex::new(jar), secure }
    }

    /// Snapshot of the jar, including pending cookie writes.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.lock().clone()
    }

    /// Encode a stored value the way it is written into a cookie.
    #[must_use]
    pub fn encode_value(value: &str) -> String {
        format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(value))
    }

    /// Decode a cookie value. Values without the `base64-` prefix are taken as-is.
    #[must_use]
    pub fn decode_value(raw: &str) -> Option<String> {
        match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => {
                let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
                String::from_utf8(bytes).ok()
            }
            None => Some(raw.to_owned()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageAdapter for CookieStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let jar = self.lock();
        let raw = jar.get(key)?.value();
        if raw.is_empty() {
            return None;
        }
        let decoded = Self::decode_value(raw);
        if decoded.is_none() {
            tracing::warn!(cookie = key, "undecodable auth cookie ignored");
        }
        decoded
    }

    fn set_item(&self, key: &str, value: &str) {
        tracing::debug!(cookie = key, "setting auth cookie");
        let cookie = Cookie::build((key.to_owned(), Self::encode_value(value)))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::days(COOKIE_MAX_AGE_DAYS));
        let mut jar = self.lock();
        *jar = std::mem::take(&mut *jar).add(cookie);
    }

    fn remove_item(&self, key: &str) {
        tracing::debug!(cookie = key, "removing auth cookie");
        let mut jar = self.lock();
        *jar = std::mem::take(&mut *jar).remove(Cookie::build(key.to_owned()).path("/"));
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
