//! stakeboard library - client-side state core for a staking dashboard
//!
//! Polling waits for the indexer to catch up, the persisted per-account
//! notification queue, and the storage it is mirrored to.

pub mod config;
pub mod confirm;
pub mod error;
pub mod notification;
pub mod poll;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::StakeboardError;
pub use notification::{NotificationItem, NotificationStore};
pub use poll::{PollOptions, poll_until};
