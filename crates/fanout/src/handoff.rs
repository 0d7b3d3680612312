//! Bounded handoff channel between the producer and the worker pool.
//!
//! A thin wrapper over [`async_channel`] that makes the lifecycle explicit:
//!
//! - There is exactly one [`HandoffSender`]. It is not `Clone`, and
//!   [`HandoffSender::close`] consumes it, so the channel is closed exactly
//!   once and nothing can be sent afterwards.
//! - Any number of [`HandoffReceiver`] clones share the stream. Every item is
//!   delivered to exactly one of them.
//! - [`HandoffReceiver::recv`] reports end-of-stream as a distinct
//!   [`Received::EndOfStream`] value, and only once every item sent before the
//!   close has been drained.

use crate::{Error, Item, Result};

/// The result of a receive on the handoff channel.
#[derive(Debug, PartialEq, Eq)]
pub enum Received {
    /// The next item, now owned by the caller.
    Item(Item),
    /// The channel is closed and drained; no more items will arrive.
    EndOfStream,
}

/// Creates a handoff channel holding at most `capacity` in-flight items.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `capacity` is zero.
pub fn channel(capacity: usize) -> Result<(HandoffSender, HandoffReceiver)> {
    if capacity == 0 {
        return Err(Error::InvalidConfig {
            reason: "handoff capacity must be greater than zero".to_owned(),
        });
    }

    let (tx, rx) = async_channel::bounded(capacity);
    Ok((HandoffSender { tx }, HandoffReceiver { rx }))
}

/// The single producing end of a handoff channel.
#[derive(Debug)]
pub struct HandoffSender {
    tx: async_channel::Sender<Item>,
}

impl HandoffSender {
    /// Sends an item, waiting while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Channel`] if every receiver has been dropped.
    pub async fn send(&self, item: Item) -> Result<()> {
        self.tx.send(item).await.map_err(|_| Error::Channel {
            context: "every worker dropped its receiver".to_owned(),
        })
    }

    /// Signals end-of-stream. Items already in the channel are still
    /// delivered.
    ///
    /// The channel may already be closed if every receiver is gone; closing it
    /// again is a no-op.
    pub fn close(self) {
        self.tx.close();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tx.len()
    }
}

/// A consuming end of a handoff channel. Clone it once per worker.
#[derive(Clone, Debug)]
pub struct HandoffReceiver {
    rx: async_channel::Receiver<Item>,
}

impl HandoffReceiver {
    /// Waits for the next item or end-of-stream.
    pub async fn recv(&self) -> Received {
        match self.rx.recv().await {
            Ok(item) => Received::Item(item),
            Err(async_channel::RecvError) => Received::EndOfStream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(channel(0), Err(Error::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn pending_items_drain_before_end_of_stream() {
        let (tx, rx) = channel(4).unwrap();
        tx.send("whale".into()).await.unwrap();
        tx.send("sea".into()).await.unwrap();
        assert_eq!(tx.len(), 2);
        tx.close();

        assert_eq!(rx.recv().await, Received::Item("whale".into()));
        assert_eq!(rx.recv().await, Received::Item("sea".into()));
        assert_eq!(rx.recv().await, Received::EndOfStream);
        assert_eq!(rx.recv().await, Received::EndOfStream);
    }

    #[tokio::test]
    async fn each_item_goes_to_exactly_one_receiver() {
        let (tx, rx) = channel(8).unwrap();
        let other = rx.clone();
        for word in ["a", "b", "c", "d"] {
            tx.send(word.into()).await.unwrap();
        }
        tx.close();

        let mut seen = Vec::new();
        loop {
            let (Received::Item(a), Received::Item(b)) = (rx.recv().await, other.recv().await)
            else {
                break;
            };
            seen.push(a);
            seen.push(b);
        }
        seen.sort();
        assert_eq!(seen, ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn send_fails_once_receivers_are_gone() {
        let (tx, rx) = channel(1).unwrap();
        drop(rx);
        assert!(matches!(
            tx.send("orphan".into()).await,
            Err(Error::Channel { .. })
        ));
    }

    #[test]
    fn closing_after_receivers_are_gone_is_a_no_op() {
        let (tx, rx) = channel(1).unwrap();
        drop(rx);
        tx.close();
    }

    #[tokio::test(start_paused = true)]
    async fn full_channel_applies_backpressure() {
        let (tx, rx) = channel(1).unwrap();
        tx.send("first".into()).await.unwrap();

        let blocked = tokio::time::timeout(
            core::time::Duration::from_millis(50),
            tx.send("second".into()),
        )
        .await;
        assert!(blocked.is_err(), "send should wait while the channel is full");

        assert_eq!(rx.recv().await, Received::Item("first".into()));
        tx.send("third".into()).await.unwrap();
        assert_eq!(rx.recv().await, Received::Item("third".into()));
    }
}
