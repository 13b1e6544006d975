//! OS signal handling.
//!
//! SIGINT and SIGTERM both translate into the shutdown broadcast; signal
//! registration happens before the task is spawned so a failure is caught
//! at startup.

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::lifecycle::Shutdown;

/// Spawns the task translating process signals into the shutdown signal.
pub fn install(shutdown: Shutdown) -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT, shutting down"),
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
        shutdown.trigger();
    });
    Ok(())
}
