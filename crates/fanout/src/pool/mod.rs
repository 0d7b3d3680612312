//! Worker pool: task spawning, the per-worker loop and the completion barrier.
//!
//! ## Structure
//!
//! - [`manager`] - [`WorkerPool`], spawning and joining workers.
//! - [`worker`] - The loop each worker runs.

pub mod manager;
pub mod worker;

pub use manager::{PoolOutcome, WorkerFailure, WorkerPool};
pub use worker::{WorkerExit, WorkerSummary};
