//! Shutdown coordination for the watchdog.

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_shutdown_signal;

/// Broadcasts a single "stop now" to the supervisor and any other
/// long-running task that subscribed before it fired.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that resolves once [`trigger`](Self::trigger) is called
    /// (or the coordinator is dropped).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown. Returns how many subscribers were notified.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Block until SIGINT/SIGTERM, then fire.
    pub async fn trigger_on_os_signal(&self) -> std::io::Result<usize> {
        wait_for_shutdown_signal().await?;
        tracing::info!("Shutdown signal received");
        Ok(self.trigger())
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
