//! Command-line surface of the `fanout` binary.
//!
//! ## Structure
//!
//! - [`config`] - Flags, environment variables and their validation.
//! - [`output`] - Text and JSON rendering of a run report.
//! - [`telemetry`] - Log subscriber setup.

pub mod config;
pub mod output;
pub mod telemetry;
