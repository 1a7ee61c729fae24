//! Diagnostic tracing on stderr.
//!
//! stdout carries the command report only. Progress and per-entry detail go
//! through `tracing`, filtered by `RUST_LOG` (default `warn`), e.g.
//! `RUST_LOG=daylio_habit_import=debug`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
