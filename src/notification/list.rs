//! Pure list operations behind the notification store
//!
//! These keep the two list invariants: one entry per key, and critical
//! entries ahead of info entries with a stable order inside each level.

use std::collections::HashSet;
use std::time::Duration;

use super::notification_item::{NotificationItem, NotificationKey};

/// One or more keys to remove.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeySet(Vec<NotificationKey>);

impl KeySet {
    pub fn contains(&self, key: NotificationKey) -> bool {
        self.0.contains(&key)
    }
}

impl From<NotificationKey> for KeySet {
    fn from(key: NotificationKey) -> Self {
        KeySet(vec![key])
    }
}

impl From<Vec<NotificationKey>> for KeySet {
    fn from(keys: Vec<NotificationKey>) -> Self {
        KeySet(keys)
    }
}

impl From<&[NotificationKey]> for KeySet {
    fn from(keys: &[NotificationKey]) -> Self {
        KeySet(keys.to_vec())
    }
}

impl<const N: usize> From<[NotificationKey; N]> for KeySet {
    fn from(keys: [NotificationKey; N]) -> Self {
        KeySet(keys.to_vec())
    }
}

/// Inserts `item`, then collapses entries sharing a key and re-sorts.
///
/// With `replace` the item is put in front and wins over any existing entry
/// (first occurrence kept). Without it the item is appended and the last
/// occurrence is kept, so the newest write wins in both cases; only the
/// resulting position differs.
pub fn insert_with_dedup(
    list: Vec<NotificationItem>,
    item: NotificationItem,
    replace: bool,
) -> Vec<NotificationItem> {
    let mut merged = if replace {
        let mut merged = Vec::with_capacity(list.len() + 1);
        merged.push(item);
        merged.extend(list);
        dedup_keep_first(merged)
    } else {
        let mut merged = list;
        merged.push(item);
        dedup_keep_last(merged)
    };

    sort_by_level(&mut merged);
    merged
}

/// Restores both invariants on a list read back from storage. Among
/// duplicate keys the later entry wins, as it would have on insert.
pub fn normalize(list: Vec<NotificationItem>) -> Vec<NotificationItem> {
    let mut list = dedup_keep_last(list);
    sort_by_level(&mut list);
    list
}

fn dedup_keep_first(list: Vec<NotificationItem>) -> Vec<NotificationItem> {
    let mut seen = HashSet::new();
    list.into_iter().filter(|n| seen.insert(n.key)).collect()
}

fn dedup_keep_last(list: Vec<NotificationItem>) -> Vec<NotificationItem> {
    let mut seen = HashSet::new();
    let mut kept: Vec<NotificationItem> = list
        .into_iter()
        .rev()
        .filter(|n| seen.insert(n.key))
        .collect();
    kept.reverse();
    kept
}

/// Stable sort, critical first.
pub fn sort_by_level(list: &mut [NotificationItem]) {
    list.sort_by_key(|n| n.level.rank());
}

/// Replaces the entry with the same key, keeping its position.
/// Returns false when there is no such entry.
pub fn replace_in_place(list: &mut [NotificationItem], item: NotificationItem) -> bool {
    match list.iter_mut().find(|n| n.key == item.key) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

/// Returns the number of removed entries.
pub fn remove_keys(list: &mut Vec<NotificationItem>, keys: &KeySet) -> usize {
    let before = list.len();
    list.retain(|n| !keys.contains(n.key));
    before - list.len()
}

/// Hides a dismissable entry until `now + duration`.
pub fn dismiss(
    list: &mut [NotificationItem],
    key: NotificationKey,
    now: i64,
    duration: Duration,
) -> bool {
    let Some(item) = list.iter_mut().find(|n| n.key == key) else {
        return false;
    };
    if !item.can_be_dismissed {
        return false;
    }

    let duration_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
    item.dismiss_time = Some(now);
    item.dismiss_to = Some(now.saturating_add(duration_ms));
    true
}

/// Entries not currently hidden by a dismissal.
pub fn visible(list: &[NotificationItem], now: i64) -> Vec<NotificationItem> {
    list.iter()
        .filter(|n| !n.is_suppressed(now))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod list_tests;
