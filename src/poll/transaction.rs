//! Waiting for the indexer to catch up with a submitted transaction

use async_trait::async_trait;

use super::poll_until::{PollOptions, poll_until};

/// Anything that can report the last block the indexer has processed.
#[async_trait]
pub trait IndexedHeight: Send + Sync {
    type Error: Send;

    async fn last_processed_height(&self) -> Result<u64, Self::Error>;
}

/// Resolves `true` once the indexer has processed `block_number`, `false` on
/// timeout. Errors from the height source end the wait.
pub async fn wait_transaction_handled<S>(
    source: &S,
    block_number: u64,
    options: PollOptions,
) -> Result<bool, S::Error>
where
    S: IndexedHeight + ?Sized,
{
    log::debug!("Waiting for indexer to reach block {}", block_number);

    poll_until(
        || async move {
            let height = source.last_processed_height().await?;
            Ok::<bool, S::Error>(height >= block_number)
        },
        options,
    )
    .await
}
