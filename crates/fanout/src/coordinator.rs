//! Run orchestration: producer, pool, completion barrier, report.
//!
//! A [`Coordinator`] drives exactly one run through
//! `Idle -> Running -> AllWorkersDone -> Reported`. [`Coordinator::execute`]
//! consumes the coordinator, so a run cannot be restarted or reported twice.
//!
//! The coordinator is the single place where failures are turned into a run
//! result: the producer's error, the pool's failures and cancellation all
//! funnel through [`Coordinator::execute`], which either returns a [`Report`]
//! or an [`Error`] and never both.

use crate::{
    Error, Filter, ItemSource, PanicPolicy, PoolConfig, Result, Tally, TallyMode, handoff,
    pool::{PoolOutcome, WorkerExit, WorkerFailure, WorkerPool, WorkerSummary},
    producer::{self, Streamed},
};
use core::time::Duration;
use std::sync::Arc;
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    Running,
    AllWorkersDone,
    Reported,
}

/// How a successful run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Outcome {
    /// Every item was produced and processed.
    Completed,
    /// The run was cancelled; the count covers only items processed before
    /// cancellation.
    Cancelled,
}

/// The result of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    /// Items that satisfied the filter.
    pub matched: u64,
    /// Wall-clock time from start to the completion barrier.
    #[cfg_attr(feature = "serde", serde(rename = "elapsed_secs", with = "as_secs_f64"))]
    pub elapsed: Duration,
    /// Workers the pool was started with.
    pub workers: usize,
    /// Items the producer handed to the channel.
    pub items_sent: u64,
    /// Items workers received and evaluated.
    pub processed: u64,
    pub tally: TallyMode,
    pub outcome: Outcome,
    /// Workers that failed under [`PanicPolicy::Continue`].
    pub failures: Vec<WorkerFailure>,
    /// Per-worker activity, ordered by worker id.
    pub summaries: Vec<WorkerSummary>,
}

impl Report {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == Outcome::Cancelled
    }
}

/// Starts the producer and the worker pool and waits for both.
#[derive(Debug)]
pub struct Coordinator {
    config: PoolConfig,
    token: CancellationToken,
    phase: Phase,
}

impl Coordinator {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            token: CancellationToken::new(),
            phase: Phase::Idle,
        })
    }

    /// Uses `token` as the caller's cancellation hook for this run.
    ///
    /// The run works on a child of `token`: cancelling `token` cancels the run,
    /// while the run's own timeout or abort never cancels `token`.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// A handle that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase went backwards");

        #[cfg(feature = "tracing")]
        tracing::debug!("Run phase {:?} -> {:?}", self.phase, next);

        self.phase = next;
    }

    /// Runs the pipeline to completion and reports the match count.
    ///
    /// # Errors
    ///
    /// - [`Error::SourceUnavailable`] if the source cannot be read.
    /// - [`Error::WorkerPanicked`] if a worker fails under
    ///   [`PanicPolicy::Abort`], or if every worker fails under
    ///   [`PanicPolicy::Continue`].
    /// - [`Error::Channel`] if the handoff breaks down for any other reason.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(workers = self.config.workers))
    )]
    pub async fn execute<S, F>(mut self, source: S, filter: F) -> Result<Report>
    where
        S: ItemSource,
        F: Filter,
    {
        let start = Instant::now();
        let run_token = self.token.child_token();
        let (tx, rx) = handoff::channel(self.config.capacity)?;
        let tally = Tally::new(self.config.tally);

        self.advance(Phase::Running);

        let source: Arc<dyn ItemSource> = Arc::new(source);
        let producer = tokio::spawn(producer::stream(source, tx, run_token.clone()));
        let pool = WorkerPool::spawn(
            &self.config,
            rx,
            Arc::new(filter),
            &tally,
            run_token.clone(),
        );
        let watchdog = self
            .config
            .timeout
            .map(|timeout| spawn_watchdog(timeout, run_token.clone()));

        let pool_outcome = pool.join(self.config.on_worker_panic).await;
        let elapsed = start.elapsed();

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }
        self.advance(Phase::AllWorkersDone);

        let produced = match producer.await {
            Ok(streamed) => streamed,
            Err(e) => Streamed {
                sent: 0,
                result: Err(Error::Channel {
                    context: format!("producer task failed: {e}"),
                }),
            },
        };

        let report = self.settle(produced, pool_outcome, tally.total(), elapsed)?;
        self.advance(Phase::Reported);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Run {:?}: {} matches in {:.6}s",
            report.outcome,
            report.matched,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    fn settle(
        &self,
        produced: Streamed,
        pool: PoolOutcome,
        matched: u64,
        elapsed: Duration,
    ) -> Result<Report> {
        let PoolOutcome {
            summaries,
            mut failures,
        } = pool;

        let Streamed { sent, result } = produced;
        let producer_cancelled = match result {
            Ok(()) => false,
            Err(Error::Cancelled) => true,
            Err(e @ Error::SourceUnavailable { .. }) => return Err(e),
            Err(e) if failures.is_empty() => return Err(e),
            // The channel broke because workers died; report the worker.
            Err(_) => false,
        };

        if !failures.is_empty() {
            let abort = self.config.on_worker_panic == PanicPolicy::Abort
                || failures.len() == self.config.workers;
            if abort {
                let WorkerFailure { worker_id, message } = failures.swap_remove(0);
                return Err(Error::WorkerPanicked { worker_id, message });
            }
        }

        let worker_cancelled = summaries.iter().any(|s| s.exit == WorkerExit::Cancelled);
        let outcome = if producer_cancelled || worker_cancelled {
            Outcome::Cancelled
        } else {
            Outcome::Completed
        };

        Ok(Report {
            matched,
            elapsed,
            workers: self.config.workers,
            items_sent: sent as u64,
            processed: summaries.iter().map(|s| s.processed).sum(),
            tally: self.config.tally,
            outcome,
            failures,
            summaries,
        })
    }
}

fn spawn_watchdog(timeout: Duration, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Run exceeded {timeout:?}, cancelling");
                token.cancel();
            }
        }
    })
}

/// Counts the items of `source` matching `filter` with `workers` workers and
/// default settings.
///
/// # Errors
///
/// See [`Coordinator::execute`].
pub async fn count_matches<S, F>(workers: usize, source: S, filter: F) -> Result<Report>
where
    S: ItemSource,
    F: Filter,
{
    Coordinator::new(PoolConfig::with_workers(workers))?
        .execute(source, filter)
        .await
}

#[cfg(feature = "serde")]
mod as_secs_f64 {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_f64(elapsed.as_secs_f64())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
