//! Polling waits for eventually-consistent backends
//!
//! After a transaction is submitted the dashboard has to wait until the indexer
//! catches up before refreshing its views. `poll_until` re-evaluates an async
//! predicate at a fixed interval until it holds or a timeout passes.

mod poll_until;
pub mod transaction;

pub use poll_until::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS, PollOptions, PollOutcome, Truthy,
    poll_until, poll_until_cancellable,
};
pub use transaction::{IndexedHeight, wait_transaction_handled};
