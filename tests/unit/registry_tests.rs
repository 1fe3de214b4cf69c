//! Unit tests for the session registry.

use std::sync::Arc;

use pdb_relay::session::{SessionRegistry, SessionSettings};

#[tokio::test]
async fn same_id_returns_the_same_session() {
    let registry = SessionRegistry::new(SessionSettings::default());

    let first = registry.session("alpha").await;
    let second = registry.session("alpha").await;

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn distinct_ids_get_distinct_sessions() {
    let registry = SessionRegistry::new(SessionSettings::default());

    let alpha = registry.session("alpha").await;
    let beta = registry.session("beta").await;

    assert!(!Arc::ptr_eq(&alpha, &beta));
}

#[tokio::test]
async fn new_sessions_start_idle() {
    let registry = SessionRegistry::new(SessionSettings::default());

    let session = registry.session("fresh").await;
    assert!(!session.lock().await.is_active());
}

#[tokio::test]
async fn cleanup_all_on_idle_registry_is_a_no_op() {
    let registry = SessionRegistry::new(SessionSettings::default());
    let _ = registry.session("idle").await;

    // Nothing running; must not hang or fail, and must be repeatable.
    registry.cleanup_all().await;
    registry.cleanup_all().await;
}

#[tokio::test]
async fn sessions_are_recreated_after_cleanup_all() {
    let registry = SessionRegistry::new(SessionSettings::default());

    let before = registry.session("alpha").await;
    registry.cleanup_all().await;
    let after = registry.session("alpha").await;

    assert!(!Arc::ptr_eq(&before, &after), "registry must drain on cleanup");
}
