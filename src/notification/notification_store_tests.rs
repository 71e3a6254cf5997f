//! Tests for notification_store

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::notification::notification_item::NotificationLevel;
use crate::storage::{FileStore, MemoryStore, StorageError};

const ADDRESS: &str = "0xAbC123";

fn run_async<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime")
        .block_on(f)
}

fn item(key: NotificationKey, level: NotificationLevel, title: &str) -> NotificationItem {
    NotificationItem::new(key, level, title, format!("{} message", title))
}

fn keys(list: &[NotificationItem]) -> Vec<NotificationKey> {
    list.iter().map(|n| n.key).collect()
}

/// Counts reads and writes and can be told to fail them.
#[derive(Default)]
struct ProbeStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_gets: bool,
    fail_sets: bool,
    hang_next_get: AtomicBool,
}

#[async_trait]
impl KeyValueStore for ProbeStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.hang_next_get.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_gets {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value).await
    }
}

fn stored_list(store: &NotificationStore<ProbeStore>) -> Value {
    let key = store.cache_key().expect("cache key");
    run_async(store.storage().inner.get(&key))
        .unwrap()
        .expect("persisted value")
}

fn ready_store() -> NotificationStore<ProbeStore> {
    let store = NotificationStore::new(ProbeStore::default());
    run_async(store.init_notification(ADDRESS));
    store
}

// ==================== init_notification ====================

#[test]
fn test_new_store_is_unloaded() {
    let store = NotificationStore::new(MemoryStore::new());
    let snapshot = store.snapshot();

    assert_eq!(snapshot.load_state, LoadState::Unloaded);
    assert!(!snapshot.mounted());
    assert!(snapshot.notifications.is_empty());
}

#[test]
fn test_cache_key_is_derived_from_lowercased_address() {
    assert_eq!(cache_key_for("0xAbC123"), "notification-0xabc123");
    assert_eq!(cache_key_for(" 0xabc123 "), "notification-0xabc123");
}

#[test]
fn test_parse_address() {
    assert_eq!(parse_address(" 0xabc ").unwrap(), "0xabc");
    assert!(matches!(
        parse_address(""),
        Err(StakeboardError::InvalidAddress(_))
    ));
    assert!(parse_address("0x ab").is_err());
}

#[test]
fn test_init_empty_address_skips_storage() {
    let store = NotificationStore::new(ProbeStore::default());

    run_async(store.init_notification(""));

    assert!(store.mounted());
    assert!(store.notification_list().is_empty());
    assert_eq!(store.cache_key(), None);
    assert_eq!(store.storage().gets.load(Ordering::SeqCst), 0);
    assert_eq!(store.storage().sets.load(Ordering::SeqCst), 0);
}

#[test]
fn test_init_absent_value_persists_empty_list() {
    let store = ready_store();

    assert!(store.mounted());
    assert_eq!(store.cache_key().as_deref(), Some("notification-0xabc123"));
    assert!(store.notification_list().is_empty());
    assert_eq!(stored_list(&store), json!([]));
}

#[test]
fn test_init_non_array_value_resets_to_empty() {
    let storage = ProbeStore {
        inner: MemoryStore::new().with_entry("notification-0xabc123", json!({"oops": true})),
        ..Default::default()
    };
    let store = NotificationStore::new(storage);

    run_async(store.init_notification(ADDRESS));

    assert!(store.mounted());
    assert!(store.notification_list().is_empty());
    assert_eq!(stored_list(&store), json!([]));
}

#[test]
fn test_init_prunes_malformed_records() {
    let valid = json!({
        "key": "unlockWithdrawal",
        "level": "info",
        "message": "Your withdrawal is ready",
        "title": "Withdrawal",
        "createdAt": 1700000000000i64,
        "canBeDismissed": true
    });
    let malformed = json!({"key": "unlockWithdrawal", "level": "loud"});
    let storage = ProbeStore {
        inner: MemoryStore::new()
            .with_entry("notification-0xabc123", json!([valid.clone(), malformed])),
        ..Default::default()
    };
    let store = NotificationStore::new(storage);

    run_async(store.init_notification(ADDRESS));

    let list = store.notification_list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].key, NotificationKey::UnlockWithdrawal);
    assert_eq!(stored_list(&store), json!([valid]));
}

#[test]
fn test_init_read_failure_ends_ready_without_overwriting() {
    let storage = ProbeStore {
        fail_gets: true,
        ..Default::default()
    };
    let store = NotificationStore::new(storage);

    run_async(store.init_notification(ADDRESS));

    assert!(store.mounted());
    assert!(store.notification_list().is_empty());
    assert_eq!(store.storage().sets.load(Ordering::SeqCst), 0);
}

#[test]
fn test_account_switch_loads_other_list() {
    let store = ready_store();
    run_async(store.add_notification(
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "rewards"),
        false,
    ));

    run_async(store.init_notification("0xdef456"));
    assert_eq!(store.cache_key().as_deref(), Some("notification-0xdef456"));
    assert!(store.notification_list().is_empty());

    run_async(store.init_notification(ADDRESS));
    assert_eq!(
        keys(&store.notification_list()),
        vec![NotificationKey::UnclaimedRewards]
    );
}

#[test]
fn test_init_publishes_loading_then_ready() {
    let store = ready_store();
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    run_async(async {
        store.init_notification("0xdef456").await;
    });

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.load_state, LoadState::Ready);
    assert_eq!(snapshot.cache_key.as_deref(), Some("notification-0xdef456"));
}

#[test]
fn test_init_collapses_duplicates_and_sorts_critical_first() {
    let stored = json!([
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "old"),
        item(NotificationKey::InactiveOperator, NotificationLevel::Info, "inactive"),
        item(NotificationKey::OverAllocate, NotificationLevel::Critical, "over"),
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "new"),
    ]);
    let storage = ProbeStore {
        inner: MemoryStore::new().with_entry("notification-0xabc123", stored),
        ..Default::default()
    };
    let store = NotificationStore::new(storage);

    run_async(store.init_notification(ADDRESS));

    let list = store.notification_list();
    assert_eq!(
        keys(&list),
        vec![
            NotificationKey::OverAllocate,
            NotificationKey::InactiveOperator,
            NotificationKey::UnclaimedRewards,
        ]
    );
    assert_eq!(list[2].title, "new");
    let persisted: Vec<NotificationItem> = serde_json::from_value(stored_list(&store)).unwrap();
    assert_eq!(persisted, *list);
}

#[test]
fn test_accounts_differing_in_punctuation_stay_separate_on_disk() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let dotted = NotificationStore::new(FileStore::new(temp_dir.path()));
    let underscored = NotificationStore::new(FileStore::new(temp_dir.path()));

    run_async(async {
        dotted.init_notification("alice.eth").await;
        dotted
            .add_notification(
                item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "rewards"),
                false,
            )
            .await;
        underscored.init_notification("alice_eth").await;
    });

    assert_eq!(dotted.notification_list().len(), 1);
    assert!(underscored.notification_list().is_empty());
}

#[test]
fn test_dropped_init_stays_loading_until_next_init() {
    let storage = ProbeStore {
        hang_next_get: AtomicBool::new(true),
        ..Default::default()
    };
    let store = NotificationStore::new(storage);

    run_async(async {
        let outcome =
            tokio::time::timeout(Duration::from_millis(10), store.init_notification(ADDRESS)).await;
        assert!(outcome.is_err());
    });

    assert_eq!(store.snapshot().load_state, LoadState::Loading);
    assert_eq!(store.cache_key(), None);

    run_async(store.add_notification(
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
        false,
    ));
    assert_eq!(store.notification_list().len(), 1);
    assert_eq!(store.storage().sets.load(Ordering::SeqCst), 0);

    run_async(store.init_notification(ADDRESS));
    assert!(store.mounted());
    assert_eq!(store.cache_key().as_deref(), Some("notification-0xabc123"));
    assert!(store.notification_list().is_empty());
    assert_eq!(stored_list(&store), json!([]));
}

// ==================== mutations ====================

#[test]
fn test_add_with_replace_keeps_newest_in_front() {
    let store = ready_store();

    run_async(async {
        store
            .add_notification(
                item(NotificationKey::InactiveOperator, NotificationLevel::Info, "inactive"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::UnlockWithdrawal, NotificationLevel::Info, "first"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::UnlockWithdrawal, NotificationLevel::Info, "second"),
                true,
            )
            .await;
    });

    let list = store.notification_list();
    assert_eq!(
        keys(&list),
        vec![NotificationKey::UnlockWithdrawal, NotificationKey::InactiveOperator]
    );
    assert_eq!(list[0].title, "second");
}

#[test]
fn test_add_without_replace_latest_write_wins() {
    let store = ready_store();

    run_async(async {
        store
            .add_notification(
                item(NotificationKey::UnlockWithdrawal, NotificationLevel::Info, "first"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::UnlockWithdrawal, NotificationLevel::Info, "second"),
                false,
            )
            .await;
    });

    let list = store.notification_list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "second");
}

#[test]
fn test_add_critical_sorts_first_and_persists() {
    let store = ready_store();

    run_async(async {
        store
            .add_notification(
                item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "rewards"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::OverAllocate, NotificationLevel::Critical, "over"),
                false,
            )
            .await;
    });

    assert_eq!(
        keys(&store.notification_list()),
        vec![NotificationKey::OverAllocate, NotificationKey::UnclaimedRewards]
    );
    let persisted: Vec<NotificationItem> = serde_json::from_value(stored_list(&store)).unwrap();
    assert_eq!(persisted, *store.notification_list());
}

#[test]
fn test_update_replaces_in_place() {
    let store = ready_store();
    run_async(async {
        store
            .add_notification(
                item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::InactiveOperator, NotificationLevel::Info, "b"),
                false,
            )
            .await;
    });

    let updated = run_async(store.update_notification(item(
        NotificationKey::UnclaimedRewards,
        NotificationLevel::Info,
        "a2",
    )));

    assert!(updated);
    let list = store.notification_list();
    assert_eq!(
        keys(&list),
        vec![NotificationKey::UnclaimedRewards, NotificationKey::InactiveOperator]
    );
    assert_eq!(list[0].title, "a2");
}

#[test]
fn test_update_missing_key_is_noop() {
    let store = ready_store();

    let updated = run_async(store.update_notification(item(
        NotificationKey::UnclaimedRewards,
        NotificationLevel::Info,
        "a",
    )));

    assert!(!updated);
    assert!(store.notification_list().is_empty());
}

#[test]
fn test_remove_many_keeps_others_in_order() {
    let store = ready_store();
    run_async(async {
        for (key, title) in [
            (NotificationKey::UnclaimedRewards, "a"),
            (NotificationKey::InactiveOperator, "b"),
            (NotificationKey::UnlockWithdrawal, "c"),
            (NotificationKey::CommissionChanged, "d"),
        ] {
            store
                .add_notification(item(key, NotificationLevel::Info, title), false)
                .await;
        }
    });

    let removed = run_async(store.remove_notification([
        NotificationKey::UnclaimedRewards,
        NotificationKey::UnlockWithdrawal,
    ]));

    assert_eq!(removed, 2);
    assert_eq!(
        keys(&store.notification_list()),
        vec![NotificationKey::InactiveOperator, NotificationKey::CommissionChanged]
    );
    assert_eq!(stored_list(&store).as_array().unwrap().len(), 2);
}

#[test]
fn test_remove_single_key() {
    let store = ready_store();
    run_async(store.add_notification(
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
        false,
    ));

    assert_eq!(
        run_async(store.remove_notification(NotificationKey::UnclaimedRewards)),
        1
    );
    assert!(store.notification_list().is_empty());
}

#[test]
fn test_sort_and_clear_persist() {
    let store = ready_store();
    run_async(async {
        store
            .add_notification(
                item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
                false,
            )
            .await;
        store.sort_notification_list().await;
    });
    assert_eq!(stored_list(&store).as_array().unwrap().len(), 1);

    run_async(store.clear_notification_list());

    assert!(store.notification_list().is_empty());
    assert_eq!(stored_list(&store), json!([]));
}

#[test]
fn test_dismiss_hides_until_window_ends() {
    let store = ready_store();
    run_async(async {
        store
            .add_notification(
                item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
                false,
            )
            .await;
        store
            .add_notification(
                item(NotificationKey::OverAllocate, NotificationLevel::Critical, "b")
                    .not_dismissable(),
                false,
            )
            .await;
    });

    let dismissed = run_async(
        store.dismiss_notification(NotificationKey::UnclaimedRewards, Duration::from_secs(3600)),
    );
    let refused = run_async(
        store.dismiss_notification(NotificationKey::OverAllocate, Duration::from_secs(3600)),
    );

    assert!(dismissed);
    assert!(!refused);
    let now = now_millis();
    assert_eq!(
        keys(&store.visible_notifications(now)),
        vec![NotificationKey::OverAllocate]
    );
    assert_eq!(store.visible_notifications(now + 3_600_001).len(), 2);
    assert_eq!(store.notification_list().len(), 2);
}

#[test]
fn test_persist_failure_keeps_in_memory_change() {
    let storage = ProbeStore {
        fail_sets: true,
        ..Default::default()
    };
    let store = NotificationStore::new(storage);
    run_async(store.init_notification(ADDRESS));

    run_async(store.add_notification(
        item(NotificationKey::LowBillingBalance, NotificationLevel::Critical, "low"),
        false,
    ));

    assert!(store.mounted());
    assert_eq!(
        keys(&store.notification_list()),
        vec![NotificationKey::LowBillingBalance]
    );
}

#[test]
fn test_mutation_before_init_stays_in_memory() {
    let store = NotificationStore::new(ProbeStore::default());

    run_async(store.add_notification(
        item(NotificationKey::UnclaimedRewards, NotificationLevel::Info, "a"),
        false,
    ));

    assert_eq!(store.notification_list().len(), 1);
    assert!(!store.mounted());
    assert_eq!(store.storage().sets.load(Ordering::SeqCst), 0);
}

#[test]
fn test_concurrent_adds_all_land_in_storage() {
    let store = Arc::new(ready_store());

    run_async(async {
        let adds = NotificationKey::ALL.into_iter().map(|key| {
            let store = Arc::clone(&store);
            async move {
                store
                    .add_notification(item(key, NotificationLevel::Info, key.as_str()), false)
                    .await;
            }
        });
        futures::future::join_all(adds).await;
    });

    assert_eq!(store.notification_list().len(), NotificationKey::ALL.len());
    assert_eq!(
        keys(&store.notification_list()),
        NotificationKey::ALL.to_vec()
    );
    let persisted: Vec<NotificationItem> = serde_json::from_value(stored_list(&store)).unwrap();
    assert_eq!(persisted, *store.notification_list());
}
