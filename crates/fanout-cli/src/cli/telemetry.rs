//! Log output for the `fanout` binary.
//!
//! Events from the `fanout` library (run phases, worker start/stop, producer
//! progress) are printed to stderr through `tracing_subscriber::fmt`, leaving
//! stdout for the report itself. Verbosity follows `RUST_LOG` and defaults to
//! `warn`:
//!
//! ```bash
//! RUST_LOG=fanout=debug fanout --input moby-dick.txt --workers 8
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
