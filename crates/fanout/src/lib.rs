//! # fanout
//!
//! A fixed-size worker pool fed by a single producer over a bounded handoff
//! channel. The producer streams tokens from an [`ItemSource`]; `n` workers
//! pull them, apply a [`Filter`], and record matches in a [`Tally`]; the
//! [`Coordinator`] waits on the completion barrier and reports the count and
//! the elapsed wall-clock time.
//!
//! ```text
//! ItemSource -> producer -> handoff channel -> n workers -> Tally -> Report
//! ```
//!
//! ## Guarantees
//!
//! - Every item is delivered to exactly one worker.
//! - The reported count equals the number of matching items, for any worker
//!   count and any [`TallyMode`].
//! - Workers only observe end-of-stream after every item sent before the close
//!   has been drained.
//! - The tally is read only after every worker has returned.
//! - A source that cannot be read fails the run; it never yields a count.
//!
//! ## Example
//!
//! ```
//! use fanout::{Contains, Coordinator, PoolConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> fanout::Result<()> {
//! let words = vec!["whale", "ship", "whaling", "sea", "whal"];
//! let report = Coordinator::new(PoolConfig::with_workers(4))?
//!     .execute(words, Contains::new("whal"))
//!     .await?;
//!
//! assert_eq!(report.matched, 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `tracing`: Emits `tracing` events and spans for the run lifecycle.
//! - `serde`: Derives `Serialize`/`Deserialize` for configuration and report
//!   types.

mod config;
mod coordinator;
mod error;
mod filter;
pub mod handoff;
pub mod pool;
pub mod producer;
mod source;
mod tally;
mod work;


pub use crate::config::*;
pub use crate::coordinator::*;
pub use crate::error::*;
pub use crate::filter::*;
pub use crate::handoff::{HandoffReceiver, HandoffSender, Received};
pub use crate::pool::{WorkerExit, WorkerFailure, WorkerSummary};
pub use crate::source::*;
pub use crate::tally::*;
pub use crate::work::*;
