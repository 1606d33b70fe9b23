//! Process-wide `tracing` setup.
//!
//! Log lines are formatted on the calling thread but written to stdout from
//! a dedicated worker thread. The hook callback logs every suppressed click
//! and must not wait on a slow or paused console.

use std::io::Write;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` if set and valid, else `configured`, else `info`.
pub fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Wraps `sink` so writes are queued and drained by a worker thread.
///
/// Buffered lines are flushed when the returned guard is dropped.
pub fn background_writer<W>(sink: W) -> (NonBlocking, WorkerGuard)
where
    W: Write + Send + 'static,
{
    tracing_appender::non_blocking(sink)
}

/// Installs the global subscriber writing to stdout.
///
/// Keep the returned guard alive for the life of the process.
pub fn init(configured_level: &str) -> WorkerGuard {
    let (writer, guard) = background_writer(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(configured_level))
        .with_writer(writer)
        .init();
    guard
}
