//! Protected content wrapper.
//!
//! Renders nothing while the startup read is in flight, nothing (plus a
//! redirect to login) when signed out, and the wrapped content when a user
//! is present.

use crate::backend::User;

use super::StoreHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Loading,
    Redirecting,
    Content(T),
}

impl<T> Guarded<T> {
    #[must_use]
    pub fn into_content(self) -> Option<T> {
        match self {
            Self::Content(content) => Some(content),
            Self::Loading | Self::Redirecting => None,
        }
    }
}

pub struct ProtectedRoute {
    handle: StoreHandle,
}

impl ProtectedRoute {
    #[must_use]
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Render against the current snapshot without waiting.
    ///
    /// # Panics
    ///
    /// Panics if the owning scope has been torn down.
    pub fn render<T>(&self, content: impl FnOnce(&User) -> T) -> Guarded<T> {
        let store = self.handle.store();
        let snapshot = store.snapshot();
        if snapshot.loading {
            return Guarded::Loading;
        }
        match snapshot.user {
            Some(user) => Guarded::Content(content(&user)),
            None => {
                store.redirect_to_login();
                Guarded::Redirecting
            }
        }
    }

    /// Wait for the auth state to settle, then render.
    ///
    /// # Panics
    ///
    /// Panics if the owning scope has been torn down.
    pub async fn settle<T>(&self, content: impl FnOnce(&User) -> T) -> Guarded<T> {
        let store = self.handle.store();
        store.loaded().await;
        self.render(content)
    }
}

#[cfg(test)]
#[path = "protected_test.rs"]
mod tests;
