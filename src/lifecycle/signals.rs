//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM (or Ctrl-C elsewhere)
//! - Let the caller translate that into [`Shutdown::trigger`](super::Shutdown::trigger)

/// Completes when the process is asked to terminate.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
