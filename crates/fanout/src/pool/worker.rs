use crate::{Filter, HandoffReceiver, Received, SimulatedWork, TallyHandle};
use rand::rngs::SmallRng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why a worker stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WorkerExit {
    /// The channel was closed and fully drained.
    Drained,
    /// The run was cancelled; buffered items were left unprocessed.
    Cancelled,
}

/// What a single worker did before it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerSummary {
    pub worker_id: usize,
    /// Items received and evaluated.
    pub processed: u64,
    /// Items that satisfied the filter.
    pub matched: u64,
    pub exit: WorkerExit,
}

/// Everything a worker task owns.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) rx: HandoffReceiver,
    pub(crate) filter: Arc<dyn Filter>,
    pub(crate) tally: TallyHandle,
    pub(crate) work: SimulatedWork,
    pub(crate) rng: SmallRng,
    pub(crate) token: CancellationToken,
}

enum Step {
    Next(Received),
    Cancelled,
}

/// Worker task: pulls items until end-of-stream or cancellation.
///
/// Each received item is evaluated against the filter; a match is recorded in
/// the tally before the simulated-work hook runs, so a match whose delay is
/// interrupted by cancellation still counts. Cancellation is checked ahead of
/// every receive, which means a cancelled worker leaves any buffered items
/// untouched.
pub(crate) async fn worker_loop(worker: Worker) -> WorkerSummary {
    let Worker {
        id,
        rx,
        filter,
        mut tally,
        work,
        mut rng,
        token,
    } = worker;

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {id} started");

    let mut processed = 0;
    let mut matched = 0;

    let exit = loop {
        let step = tokio::select! {
            biased;
            () = token.cancelled() => Step::Cancelled,
            received = rx.recv() => Step::Next(received),
        };

        let item = match step {
            Step::Cancelled => break WorkerExit::Cancelled,
            Step::Next(Received::EndOfStream) => break WorkerExit::Drained,
            Step::Next(Received::Item(item)) => item,
        };

        processed += 1;
        if !filter.matches(&item) {
            continue;
        }

        matched += 1;
        tally.record();

        let interrupted = tokio::select! {
            biased;
            () = token.cancelled() => true,
            () = work.perform(&mut rng) => false,
        };
        if interrupted {
            break WorkerExit::Cancelled;
        }
    };

    tally.finish();

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {id} stopped ({exit:?}): processed={processed} matched={matched}");

    WorkerSummary {
        worker_id: id,
        processed,
        matched,
        exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Contains, Tally, TallyMode, handoff};

    fn worker(rx: HandoffReceiver, tally: &Tally, token: CancellationToken) -> Worker {
        Worker {
            id: 0,
            rx,
            filter: Arc::new(Contains::new("whal")),
            tally: tally.handle(),
            work: SimulatedWork::None,
            rng: SimulatedWork::worker_rng(Some(0), 0),
            token,
        }
    }

    #[tokio::test]
    async fn drains_until_end_of_stream() {
        let (tx, rx) = handoff::channel(8).unwrap();
        for word in ["whale", "ship", "whaling", "sea", "whal"] {
            tx.send(word.into()).await.unwrap();
        }
        tx.close();

        let tally = Tally::new(TallyMode::Merged);
        let summary = worker_loop(worker(rx, &tally, CancellationToken::new())).await;

        assert_eq!(summary.exit, WorkerExit::Drained);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.matched, 3);
        assert_eq!(tally.total(), 3);
    }

    #[tokio::test]
    async fn cancelled_worker_leaves_buffered_items() {
        let (tx, rx) = handoff::channel(8).unwrap();
        for word in ["whale", "whale", "whale"] {
            tx.send(word.into()).await.unwrap();
        }

        let token = CancellationToken::new();
        token.cancel();
        let tally = Tally::new(TallyMode::Atomic);
        let summary = worker_loop(worker(rx, &tally, token)).await;

        assert_eq!(summary.exit, WorkerExit::Cancelled);
        assert_eq!(summary.processed, 0);
        assert_eq!(tally.total(), 0);
        assert_eq!(tx.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_simulated_work() {
        let (tx, rx) = handoff::channel(8).unwrap();
        tx.send("whale".into()).await.unwrap();
        tx.send("whale".into()).await.unwrap();

        let token = CancellationToken::new();
        let tally = Tally::new(TallyMode::Locked);
        let mut w = worker(rx, &tally, token.clone());
        w.work = SimulatedWork::Fixed(core::time::Duration::from_secs(60));
        let handle = tokio::spawn(worker_loop(w));

        tokio::time::sleep(core::time::Duration::from_secs(1)).await;
        token.cancel();
        let summary = handle.await.unwrap();

        assert_eq!(summary.exit, WorkerExit::Cancelled);
        assert_eq!(summary.matched, 1);
        assert_eq!(tally.total(), 1);
    }
}
