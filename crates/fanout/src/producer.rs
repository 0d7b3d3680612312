use crate::{Error, HandoffSender, Item, ItemSource, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a producer run did: how many items reached the channel, and how it
/// ended.
#[derive(Debug, PartialEq, Eq)]
pub struct Streamed {
    pub sent: usize,
    pub result: Result<()>,
}

/// Streams every item of `source` into the handoff channel, then closes it.
///
/// The source is read once. Items are sent one at a time in source order; each
/// send waits for channel capacity, which is the pool's only backpressure. The
/// channel is closed exactly once on every path out of this function, so
/// workers always observe end-of-stream.
///
/// Returns the number of items sent.
///
/// # Errors
///
/// - [`Error::SourceUnavailable`] if the source cannot be read. Nothing is
///   sent.
/// - [`Error::Cancelled`] if `token` fires before the last item is sent.
/// - [`Error::Channel`] if every worker has dropped its receiver.
pub async fn run(
    source: Arc<dyn ItemSource>,
    tx: HandoffSender,
    token: CancellationToken,
) -> Result<usize> {
    let Streamed { sent, result } = stream(source, tx, token).await;
    result.map(|()| sent)
}

/// Like [`run`], but reports the number of items sent on every exit path,
/// including cancellation.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(source = source.name())))]
pub async fn stream(
    source: Arc<dyn ItemSource>,
    tx: HandoffSender,
    token: CancellationToken,
) -> Streamed {
    let items = match read(&source).await {
        Ok(items) => items,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Item source failed: {e}");
            tx.close();
            return Streamed {
                sent: 0,
                result: Err(e),
            };
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!("Producing {} items", items.len());

    let mut sent = 0;
    for item in items {
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            res = tx.send(item) => res,
        };

        if let Err(e) = outcome {
            #[cfg(feature = "tracing")]
            tracing::debug!("Producer stopping after {sent} items: {e}");
            tx.close();
            return Streamed {
                sent,
                result: Err(e),
            };
        }
        sent += 1;
    }

    tx.close();

    #[cfg(feature = "tracing")]
    tracing::debug!("Producer sent {sent} items and closed the channel");

    Streamed {
        sent,
        result: Ok(()),
    }
}

/// Runs [`ItemSource::produce`] on the blocking pool; sources may do file I/O.
async fn read(source: &Arc<dyn ItemSource>) -> Result<Vec<Item>> {
    let blocking = Arc::clone(source);
    match tokio::task::spawn_blocking(move || blocking.produce()).await {
        Ok(items) => items,
        Err(e) => Err(Error::source_unavailable(source.name(), e)),
    }
}
