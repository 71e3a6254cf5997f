use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 30000;

/// Interval and overall deadline for a polling wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_millis(DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS)
    }
}

impl PollOptions {
    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// How a cancellable poll finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The predicate returned a truthy value
    Satisfied,
    /// The timeout elapsed without a truthy value
    TimedOut,
    /// The cancellation token fired
    Cancelled,
}

/// Boolean-like predicate results. `Option` is truthy when `Some`, whatever it
/// holds. Collections have no impl; map them to a `bool` in the predicate.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

/// Polls `predicate` until it is truthy or `options.timeout` has elapsed.
///
/// The first evaluation happens immediately, so the predicate always runs at
/// least once even when the timeout is shorter than the interval. Returns
/// `Ok(false)` on timeout. An error from the predicate ends the wait and is
/// returned as is.
///
/// The timeout is only checked between evaluations: a predicate future that
/// never resolves keeps the caller waiting. Wrap the call in
/// `tokio::time::timeout` or use [`poll_until_cancellable`] for a hard bound.
pub async fn poll_until<F, Fut, T, E>(predicate: F, options: PollOptions) -> Result<bool, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Truthy,
{
    let never = CancellationToken::new();
    let outcome = poll_until_cancellable(predicate, options, &never).await?;
    Ok(outcome == PollOutcome::Satisfied)
}

/// Same loop as [`poll_until`], also stopped by `cancel`.
///
/// Cancellation drops an in-flight evaluation and schedules no further ones.
pub async fn poll_until_cancellable<F, Fut, T, E>(
    mut predicate: F,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<PollOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Truthy,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        attempt += 1;
        let value = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            result = predicate() => result?,
        };

        if value.is_truthy() {
            log::debug!("Poll satisfied after {} attempt(s)", attempt);
            return Ok(PollOutcome::Satisfied);
        }

        let remaining = options.timeout.saturating_sub(start.elapsed());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = sleep(options.interval.min(remaining)) => {}
        }

        if start.elapsed() >= options.timeout {
            log::debug!(
                "Poll timed out after {} attempt(s) ({:?})",
                attempt,
                options.timeout
            );
            return Ok(PollOutcome::TimedOut);
        }
    }
}

#[cfg(test)]
#[path = "poll_until_tests.rs"]
mod poll_until_tests;
