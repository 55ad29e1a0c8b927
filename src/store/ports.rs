//! Host ports the session store drives: navigation and notifications.
//!
//! Session-scoped storage reuses [`crate::backend::StorageAdapter`].

use std::sync::{Mutex, PoisonError};

// =============================================================================
// NAVIGATION
// =============================================================================

/// Client-side router of the hosting application.
pub trait Navigator: Send + Sync {
    /// Scheme + host (+ port) of the running site, without a trailing slash.
    fn origin(&self) -> String;
    /// Current location: path plus any query string.
    fn current_path(&self) -> String;
    /// Navigate to `path`.
    fn push(&self, path: &str);
    /// Re-render the current location with fresh auth state.
    fn refresh(&self);
}

/// In-memory navigation history. Backs headless clients and tests.
#[derive(Debug)]
pub struct History {
    origin: String,
    inner: Mutex<HistoryInner>,
}

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<String>,
    refreshes: usize,
}

impl History {
    #[must_use]
    pub fn new(origin: impl Into<String>, initial_path: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_owned();
        Self { origin, inner: Mutex::new(HistoryInner { entries: vec![initial_path.into()], refreshes: 0 }) }
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.lock().refreshes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for History {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn current_path(&self) -> String {
        self.lock().entries.last().cloned().unwrap_or_else(|| "/".into())
    }

    fn push(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.lock().entries.push(path.to_owned());
    }

    fn refresh(&self) {
        self.lock().refreshes += 1;
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
    Success,
}

/// A short user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    #[must_use]
    pub fn info(title: &str, description: &str) -> Self {
        Self { title: title.to_owned(), description: description.to_owned(), variant: ToastVariant::Default }
    }

    /// Destructive toast titled "Error".
    #[must_use]
    pub fn error(description: &str) -> Self {
        Self { title: "Error".to_owned(), description: description.to_owned(), variant: ToastVariant::Destructive }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}
