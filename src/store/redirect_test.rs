use super::*;
use crate::backend::MemoryStorage;

#[test]
fn take_is_read_once() {
    let storage = MemoryStorage::new();
    assert!(remember(&storage, "/dashboard"));
    assert_eq!(take(&storage).as_deref(), Some("/dashboard"));
    assert_eq!(take(&storage), None);
    assert_eq!(peek(&storage), None);
}

#[test]
fn foreign_targets_are_not_stored() {
    let storage = MemoryStorage::new();
    assert!(!remember(&storage, "https://evil.example/"));
    assert_eq!(peek(&storage), None);
}

#[test]
fn tampered_value_is_dropped_on_take() {
    let storage = MemoryStorage::new();
    storage.set_item(REDIRECT_INTENT_KEY, "//evil.example");
    assert_eq!(take(&storage), None);
    assert_eq!(peek(&storage), None);
}

#[test]
fn clear_removes_key() {
    let storage = MemoryStorage::new();
    remember(&storage, "/dashboard");
    clear(&storage);
    assert_eq!(peek(&storage), None);
}
