//! Per-account notification store
//!
//! Holds the notification list of the active account in memory and mirrors
//! every change to a [`KeyValueStore`] under a key derived from the account
//! address. Readers get snapshots synchronously or subscribe to changes.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, watch};

use super::list::{self, KeySet};
use super::notification_item::{NotificationItem, NotificationKey, now_millis};
use crate::error::StakeboardError;
use crate::storage::KeyValueStore;

const CACHE_KEY_PREFIX: &str = "notification";

/// Storage key for an account's list. Addresses compare case-insensitively.
pub fn cache_key_for(address: &str) -> String {
    format!("{}-{}", CACHE_KEY_PREFIX, address.trim().to_lowercase())
}

/// Checks an account address given on the command line. Empty input and
/// embedded whitespace are rejected.
pub fn parse_address(input: &str) -> Result<String, StakeboardError> {
    let address = input.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(StakeboardError::InvalidAddress(input.to_string()));
    }
    Ok(address.to_string())
}

/// Loading progress for the current account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Ready,
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default)]
pub struct NotificationSnapshot {
    pub load_state: LoadState,
    pub cache_key: Option<String>,
    pub notifications: Arc<Vec<NotificationItem>>,
}

impl NotificationSnapshot {
    /// The list is only meaningful once this is true.
    pub fn mounted(&self) -> bool {
        self.load_state == LoadState::Ready
    }
}

#[derive(Debug, Default)]
struct Session {
    load_state: LoadState,
    cache_key: Option<String>,
    list: Vec<NotificationItem>,
}

/// Notification list of the active account.
///
/// All mutations hold one async lock from the list change through the storage
/// write, so writes for a cache key never interleave. A failed write is logged
/// and the in-memory change stands.
pub struct NotificationStore<S> {
    storage: S,
    session: Mutex<Session>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
}

impl<S: KeyValueStore> NotificationStore<S> {
    pub fn new(storage: S) -> Self {
        let (snapshot_tx, _) = watch::channel(NotificationSnapshot::default());
        Self {
            storage,
            session: Mutex::new(Session::default()),
            snapshot_tx,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn mounted(&self) -> bool {
        self.snapshot_tx.borrow().mounted()
    }

    pub fn cache_key(&self) -> Option<String> {
        self.snapshot_tx.borrow().cache_key.clone()
    }

    pub fn notification_list(&self) -> Arc<Vec<NotificationItem>> {
        Arc::clone(&self.snapshot_tx.borrow().notifications)
    }

    /// Notifications not hidden by a dismissal at `now` (epoch millis).
    pub fn visible_notifications(&self, now: i64) -> Vec<NotificationItem> {
        list::visible(&self.notification_list(), now)
    }

    /// Loads the list for `address`, replacing the current account's.
    ///
    /// An empty address yields an empty, ready store without touching storage.
    /// Records that fail to deserialize are dropped, duplicate keys collapse
    /// to the later entry, the rest is sorted by level, and the result is
    /// written back. A value that is missing or not an array becomes `[]`.
    ///
    /// Dropping the returned future before it completes leaves the store in
    /// [`LoadState::Loading`] with no cache key and an empty list. Mutations
    /// made in that state are kept in memory only and never persisted; call
    /// `init_notification` again to recover.
    pub async fn init_notification(&self, address: &str) {
        let mut session = self.session.lock().await;

        session.load_state = LoadState::Loading;
        session.cache_key = None;
        session.list.clear();
        self.publish(&session);

        let address = address.trim();
        if address.is_empty() {
            session.load_state = LoadState::Ready;
            self.publish(&session);
            return;
        }

        let cache_key = cache_key_for(address);
        let (loaded, write_back) = match self.storage.get(&cache_key).await {
            Ok(Some(Value::Array(records))) => {
                (list::normalize(parse_records(&cache_key, records)), true)
            }
            Ok(Some(other)) => {
                log::warn!(
                    "Stored notifications for {} are not a list ({}), resetting",
                    cache_key,
                    json_type_name(&other)
                );
                (Vec::new(), true)
            }
            Ok(None) => (Vec::new(), true),
            Err(e) => {
                log::error!("Failed to load notifications for {}: {}", cache_key, e);
                (Vec::new(), false)
            }
        };

        session.cache_key = Some(cache_key);
        session.list = loaded;
        if write_back {
            self.persist(&session).await;
        }

        session.load_state = LoadState::Ready;
        self.publish(&session);
    }

    /// Adds `item`, keeping one entry per key and the level order.
    ///
    /// With `replace` the item is placed ahead of its level group, otherwise
    /// behind it. Either way it supersedes any entry with the same key.
    pub async fn add_notification(&self, item: NotificationItem, replace: bool) {
        self.mutate(|session| {
            let current = std::mem::take(&mut session.list);
            session.list = list::insert_with_dedup(current, item, replace);
        })
        .await;
    }

    /// Replaces the entry with the same key in place. Returns false when
    /// there is none.
    pub async fn update_notification(&self, item: NotificationItem) -> bool {
        self.mutate(|session| list::replace_in_place(&mut session.list, item))
            .await
    }

    /// Removes every entry whose key is in `keys`. Returns how many went.
    pub async fn remove_notification(&self, keys: impl Into<KeySet>) -> usize {
        let keys = keys.into();
        self.mutate(|session| list::remove_keys(&mut session.list, &keys))
            .await
    }

    pub async fn sort_notification_list(&self) {
        self.mutate(|session| list::sort_by_level(&mut session.list))
            .await;
    }

    pub async fn clear_notification_list(&self) {
        self.mutate(|session| session.list.clear()).await;
    }

    /// Hides a dismissable notification for `duration` from now.
    pub async fn dismiss_notification(&self, key: NotificationKey, duration: Duration) -> bool {
        let now = now_millis();
        self.mutate(|session| list::dismiss(&mut session.list, key, now, duration))
            .await
    }

    async fn mutate<R>(&self, change: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock().await;
        let result = change(&mut *session);
        self.persist(&session).await;
        self.publish(&session);
        result
    }

    async fn persist(&self, session: &Session) {
        let Some(cache_key) = session.cache_key.as_deref() else {
            return;
        };

        let value = match serde_json::to_value(&session.list) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize notifications for {}: {}", cache_key, e);
                return;
            }
        };

        if let Err(e) = self.storage.set(cache_key, value).await {
            log::error!("Failed to persist notifications for {}: {}", cache_key, e);
        }
    }

    fn publish(&self, session: &Session) {
        self.snapshot_tx.send_replace(NotificationSnapshot {
            load_state: session.load_state,
            cache_key: session.cache_key.clone(),
            notifications: Arc::new(session.list.clone()),
        });
    }
}

fn parse_records(cache_key: &str, records: Vec<Value>) -> Vec<NotificationItem> {
    let total = records.len();
    let items: Vec<NotificationItem> = records
        .into_iter()
        .filter_map(|record| match NotificationItem::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                log::debug!("Dropping invalid notification in {}: {}", cache_key, e);
                None
            }
        })
        .collect();

    if items.len() < total {
        log::info!(
            "Pruned {} invalid notification(s) from {}",
            total - items.len(),
            cache_key
        );
    }
    items
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "notification_store_tests.rs"]
mod notification_store_tests;
