//! Fixed-size pool of asynchronous workers sharing one handoff receiver.
//!
//! This module defines the [`WorkerPool`] struct, which spawns exactly `n`
//! worker tasks onto a [`JoinSet`] and acts as the run's completion barrier.
//! Every worker clones the same [`HandoffReceiver`], so items are pulled by
//! whichever worker is free rather than assigned round-robin.
//!
//! The pool also watches for abnormal exits. A panicking worker is recorded as
//! a [`WorkerFailure`]; under [`PanicPolicy::Abort`] the pool additionally
//! cancels the shared [`CancellationToken`] so the producer and the remaining
//! workers stop promptly.

use super::worker::{Worker, WorkerSummary, worker_loop};
use crate::{Filter, HandoffReceiver, PanicPolicy, PoolConfig, SimulatedWork, Tally};
use std::{any::Any, collections::HashMap, sync::Arc};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// A worker that terminated abnormally.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerFailure {
    pub worker_id: usize,
    pub message: String,
}

/// Result of waiting on the whole pool.
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// One entry per worker that returned normally.
    pub summaries: Vec<WorkerSummary>,
    /// One entry per worker that did not.
    pub failures: Vec<WorkerFailure>,
}

/// A running set of workers.
pub struct WorkerPool {
    tasks: JoinSet<WorkerSummary>,
    worker_ids: HashMap<task::Id, usize>,
    token: CancellationToken,
}

impl WorkerPool {
    /// Spawns `config.workers` workers onto the current Tokio runtime.
    ///
    /// Each worker gets a clone of `rx`, the shared `filter`, its own
    /// [`TallyHandle`](crate::TallyHandle) and its own delay RNG.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(
        config: &PoolConfig,
        rx: HandoffReceiver,
        filter: Arc<dyn Filter>,
        tally: &Tally,
        token: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        let mut worker_ids = HashMap::with_capacity(config.workers);

        for id in 0..config.workers {
            let worker = Worker {
                id,
                rx: rx.clone(),
                filter: Arc::clone(&filter),
                tally: tally.handle(),
                work: config.work,
                rng: SimulatedWork::worker_rng(config.seed, id),
                token: token.clone(),
            };
            let handle = tasks.spawn(worker_loop(worker));
            worker_ids.insert(handle.id(), id);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {} workers", config.workers);

        Self {
            tasks,
            worker_ids,
            token,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Waits until every worker has returned.
    ///
    /// This is the completion barrier: it only resolves once each worker has
    /// either observed end-of-stream, observed cancellation, or failed.
    pub async fn join(mut self, policy: PanicPolicy) -> PoolOutcome {
        let mut outcome = PoolOutcome {
            summaries: Vec::with_capacity(self.tasks.len()),
            failures: Vec::new(),
        };

        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((_, summary)) => outcome.summaries.push(summary),
                Err(err) => {
                    let failure = self.failure(err);

                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        "Worker {} exited abnormally: {}",
                        failure.worker_id,
                        failure.message
                    );

                    if policy == PanicPolicy::Abort && !self.token.is_cancelled() {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Aborting run after worker failure");
                        self.token.cancel();
                    }
                    outcome.failures.push(failure);
                }
            }
        }

        outcome.summaries.sort_by_key(|s| s.worker_id);
        outcome
    }

    fn failure(&self, err: JoinError) -> WorkerFailure {
        let worker_id = self
            .worker_ids
            .get(&err.id())
            .copied()
            .unwrap_or(usize::MAX);
        let message = if err.is_panic() {
            panic_message(err.into_panic())
        } else {
            "worker task was cancelled".to_owned()
        };
        WorkerFailure { worker_id, message }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
