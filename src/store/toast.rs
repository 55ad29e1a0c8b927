//! Toast queue — the in-process `Notifier`.
//!
//! Toasts get a random short id and auto-expire five seconds after they were
//! shown. Expired entries are pruned on every push and read.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;

use super::ports::{Notifier, Toast};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);
const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

struct QueuedToast {
    id: String,
    toast: Toast,
    shown_at: Instant,
}

#[derive(Default)]
pub struct ToastQueue {
    inner: Mutex<Vec<QueuedToast>>,
}

impl ToastQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible toasts, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<(String, Toast)> {
        self.active_at(Instant::now())
    }

    /// Remove a toast before it expires. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|t| t.id != id);
        queue.len() != before
    }

    /// Internal: push with explicit timestamp (for testing).
    fn push_at(&self, toast: Toast, now: Instant) -> String {
        let id = generate_toast_id();
        let mut queue = self.lock();
        prune_expired(&mut queue, now);
        queue.push(QueuedToast { id: id.clone(), toast, shown_at: now });
        id
    }

    /// Internal: prune and list with explicit timestamp (for testing).
    fn active_at(&self, now: Instant) -> Vec<(String, Toast)> {
        let mut queue = self.lock();
        prune_expired(&mut queue, now);
        queue
            .iter()
            .map(|t| (t.id.clone(), t.toast.clone()))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QueuedToast>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        tracing::debug!(title = %toast.title, variant = ?toast.variant, "toast");
        self.push_at(toast, Instant::now());
    }
}

fn prune_expired(queue: &mut Vec<QueuedToast>, now: Instant) {
    queue.retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
}

fn generate_toast_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;
