//! Error types for a fan-out run.
//!
//! This module defines the central `Error` enum, which captures every failure a
//! run can surface to its caller. Producer and worker failures all travel to
//! the [`Coordinator`], which is the only component that decides whether a run
//! aborts or continues.
//!
//! ## Error Cases
//! - `SourceUnavailable`: The item source could not be read.
//! - `Channel`: The handoff channel failed (every receiver is gone).
//! - `WorkerPanicked`: A worker task terminated abnormally.
//! - `Cancelled`: The run was cancelled before the producer finished.
//! - `InvalidConfig`: The pool was configured with unusable values.
//!
//! Misusing the channel (sending after close, closing twice) is not an error
//! case: [`HandoffSender::close`] consumes the sender, so neither can be
//! written.
//!
//! [`Coordinator`]: crate::Coordinator
//! [`HandoffSender::close`]: crate::HandoffSender::close

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for a fan-out run.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The item source could not be read.
    #[error("Item source `{source_name}` unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Internal channel send/receive failure (e.g. every receiver dropped).
    #[error("Channel error: {context}")]
    Channel { context: String },

    /// A worker exited abnormally.
    #[error("Worker {worker_id} panicked: {message}")]
    WorkerPanicked { worker_id: usize, message: String },

    /// The run was cancelled.
    #[error("Run cancelled")]
    Cancelled,

    /// The pool configuration was rejected.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    pub(crate) fn source_unavailable(
        source_name: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
