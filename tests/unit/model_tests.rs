//! Unit tests for action models.

use std::time::Duration;

use chrono::Utc;

use purge_relay::models::action::{BatchResult, PendingAction, PurgeScope};

#[test]
fn new_pending_action_has_unique_id_and_fresh_timestamp() {
    let a = PendingAction::new("U1".into(), "C1".into(), PurgeScope::EntireCache);
    let b = PendingAction::new("U1".into(), "C1".into(), PurgeScope::EntireCache);
    assert_ne!(a.id, b.id);
    assert!(Utc::now() - a.created_at < chrono::Duration::seconds(5));
}

#[test]
fn expiry_is_measured_from_creation() {
    let mut a = PendingAction::new("U1".into(), "C1".into(), PurgeScope::EntireCache);
    a.created_at = Utc::now() - chrono::Duration::seconds(90);

    assert!(a.is_expired_at(Utc::now(), Duration::from_secs(60)));
    assert!(!a.is_expired_at(Utc::now(), Duration::from_secs(120)));
}

#[test]
fn confirm_preserves_the_action() {
    let scope = PurgeScope::UriList(vec!["http://a.com/x".into()]);
    let pending = PendingAction::new("U1".into(), "C1".into(), scope.clone());
    let queued = pending.clone().confirm();

    assert_eq!(queued.action, pending);
    assert_eq!(queued.requester(), "U1");
    assert_eq!(queued.channel(), "C1");
    assert_eq!(queued.scope(), &scope);
    assert!(queued.queued_at >= pending.created_at);
}

#[test]
fn scope_uris() {
    assert!(PurgeScope::EntireCache.uris().is_empty());
    let list = PurgeScope::UriList(vec!["http://a.com/x".into()]);
    assert_eq!(list.uris(), ["http://a.com/x".to_owned()]);
}

#[test]
fn scope_serialization() {
    let everything = serde_json::to_string(&PurgeScope::EntireCache).expect("serialize");
    assert_eq!(everything, r#"{"kind":"entire_cache"}"#);

    let list = PurgeScope::UriList(vec!["http://a.com/x".into()]);
    let json = serde_json::to_string(&list).expect("serialize");
    assert_eq!(json, r#"{"kind":"uri_list","uris":["http://a.com/x"]}"#);
    let back: PurgeScope = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, list);
}

#[test]
fn batch_result_success_flag() {
    assert!(BatchResult::Success { cleared: vec![] }.is_success());
    assert!(!BatchResult::Failure {
        error: "x".into()
    }
    .is_success());
}
