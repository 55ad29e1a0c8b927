//! Redirect intent — where to send the user after they sign in.
//!
//! One key in session-scoped storage. Written when an unauthenticated visit
//! to a protected page is bounced to login, read-once after sign-in, cleared
//! on sign-out.

use crate::backend::StorageAdapter;
use crate::paths::local_redirect_target;

pub const REDIRECT_INTENT_KEY: &str = "redirectAfterLogin";

/// Remember `path`. Non-local targets are refused.
pub fn remember(storage: &dyn StorageAdapter, path: &str) -> bool {
    let Some(target) = local_redirect_target(path) else {
        tracing::warn!(path, "refusing non-local redirect intent");
        return false;
    };
    storage.set_item(REDIRECT_INTENT_KEY, target);
    true
}

/// Read and delete the stored intent.
pub fn take(storage: &dyn StorageAdapter) -> Option<String> {
    let stored = storage.get_item(REDIRECT_INTENT_KEY)?;
    storage.remove_item(REDIRECT_INTENT_KEY);
    local_redirect_target(&stored).map(str::to_owned)
}

#[must_use]
pub fn peek(storage: &dyn StorageAdapter) -> Option<String> {
    storage.get_item(REDIRECT_INTENT_KEY)
}

pub fn clear(storage: &dyn StorageAdapter) {
    storage.remove_item(REDIRECT_INTENT_KEY);
}

#[cfg(test)]
#[path = "redirect_test.rs"]
mod tests;
