use super::*;
use crate::store::ports::ToastVariant;

#[test]
fn notify_makes_toast_visible() {
    let queue = ToastQueue::new();
    queue.notify(Toast::info("Signed out", "You have been signed out successfully."));
    let active = queue.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].1.title, "Signed out");
    assert_eq!(active[0].1.variant, ToastVariant::Default);
}

#[test]
fn toasts_expire_after_lifetime() {
    let queue = ToastQueue::new();
    let start = Instant::now();
    queue.push_at(Toast::error("boom"), start);

    assert_eq!(queue.active_at(start + Duration::from_secs(4)).len(), 1);
    assert!(queue.active_at(start + TOAST_LIFETIME).is_empty());
}

#[test]
fn push_prunes_expired_toasts_without_a_read() {
    let queue = ToastQueue::new();
    let start = Instant::now();
    for n in 0..3 {
        queue.push_at(Toast::error(&format!("old {n}")), start);
    }
    queue.push_at(Toast::error("new"), start + TOAST_LIFETIME);

    assert_eq!(queue.lock().len(), 1);
}

#[test]
fn dismiss_removes_only_that_toast() {
    let queue = ToastQueue::new();
    let now = Instant::now();
    let first = queue.push_at(Toast::error("one"), now);
    let _second = queue.push_at(Toast::error("two"), now);

    assert!(queue.dismiss(&first));
    assert!(!queue.dismiss(&first));
    let active = queue.active_at(now);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].1.description, "two");
}

#[test]
fn toast_ids_are_short_base36() {
    let id = generate_toast_id();
    assert_eq!(id.len(), ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
}

#[test]
fn error_toast_is_destructive() {
    let toast = Toast::error("Invalid login credentials");
    assert_eq!(toast.title, "Error");
    assert_eq!(toast.variant, ToastVariant::Destructive);
}
