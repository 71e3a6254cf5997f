//! Awaitable confirm/cancel prompts
//!
//! Some actions (deploying a project flagged as unsafe) need an explicit user
//! answer from a callback-driven prompt. `confirmation` hands the prompt a
//! [`ConfirmHandle`] and gives the caller a future that resolves with the
//! answer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Answering side, given to the prompt.
#[derive(Debug)]
pub struct ConfirmHandle {
    tx: oneshot::Sender<bool>,
}

impl ConfirmHandle {
    pub fn confirm(self) {
        let _ = self.tx.send(true);
    }

    pub fn cancel(self) {
        let _ = self.tx.send(false);
    }
}

/// Resolves to the prompt's answer. A handle dropped without answering
/// counts as cancel.
#[derive(Debug)]
pub struct Confirmation {
    rx: oneshot::Receiver<bool>,
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|answer| answer.unwrap_or(false))
    }
}

pub fn confirmation() -> (ConfirmHandle, Confirmation) {
    let (tx, rx) = oneshot::channel();
    (ConfirmHandle { tx }, Confirmation { rx })
}

/// Returns `true` straight away for a safe action, otherwise shows the prompt
/// and waits for its answer.
pub async fn confirm_if<P>(is_unsafe: bool, prompt: P) -> bool
where
    P: FnOnce(ConfirmHandle),
{
    if !is_unsafe {
        return true;
    }

    let (handle, answer) = confirmation();
    prompt(handle);
    let confirmed = answer.await;
    log::debug!("Unsafe action confirmed: {}", confirmed);
    confirmed
}
