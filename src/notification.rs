//! Notification module for stakeboard
//!
//! Per-account notification records, the list rules that keep one entry per
//! key in priority order, and the persisted store that owns the list.

pub mod list;
mod notification_item;
mod notification_store;

pub use list::KeySet;
pub use notification_item::{
    ButtonProps, NotificationItem, NotificationKey, NotificationLevel, now_millis,
};
pub use notification_store::{
    LoadState, NotificationSnapshot, NotificationStore, cache_key_for, parse_address,
};
