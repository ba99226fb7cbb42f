//! Head-following listener over `eth_blockNumber`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ListenerConfig;
use crate::listener::ListenerLifecycle;
use crate::provider::ProviderHandle;
use crate::supervisor::SignalSender;

const UNSET: u64 = u64::MAX;

/// Listener that follows the chain head on the active provider and reports
/// provider faults back to the supervisor.
pub struct BlockPoller {
    config: ListenerConfig,
    signals: SignalSender,
}

/// Handle to a (possibly stopped) poller.
#[derive(Debug)]
pub struct PollerHandle {
    cursor: Arc<AtomicU64>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Last head observed, if any.
    pub fn last_block(&self) -> Option<u64> {
        match self.cursor.load(Ordering::Relaxed) {
            UNSET => None,
            block => Some(block),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished()) && !self.token.is_cancelled()
    }
}

impl BlockPoller {
    pub fn new(config: ListenerConfig, signals: SignalSender) -> Self {
        Self { config, signals }
    }

    fn spawn(&self, provider: &ProviderHandle, cursor: Arc<AtomicU64>) -> (CancellationToken, JoinHandle<()>) {
        let token = CancellationToken::new();
        let follower = Follower {
            provider: provider.clone(),
            cursor,
            token: token.clone(),
            interval: Duration::from_millis(self.config.poll_interval_ms),
            crash_after_errors: self.config.crash_after_errors,
            signals: self.signals.clone(),
        };
        (token, tokio::spawn(follower.run()))
    }
}

impl ListenerLifecycle for BlockPoller {
    type Handle = PollerHandle;

    fn start(&mut self, provider: &ProviderHandle) -> PollerHandle {
        tracing::info!(provider = %provider.role(), endpoint = %provider.endpoint(), "Block listener starting");
        let cursor = Arc::new(AtomicU64::new(UNSET));
        let (token, task) = self.spawn(provider, cursor.clone());
        PollerHandle {
            cursor,
            token,
            task: Some(task),
        }
    }

    fn stop(&mut self, handle: &mut PollerHandle) {
        tracing::info!(last_block = ?handle.last_block(), "Block listener stopping");
        handle.token.cancel();
        handle.task = None;
    }

    fn recover(&mut self, handle: &mut PollerHandle, provider: &ProviderHandle) {
        tracing::info!(
            provider = %provider.role(),
            resume_from = ?handle.last_block(),
            "Block listener resuming"
        );
        let (token, task) = self.spawn(provider, handle.cursor.clone());
        handle.token = token;
        handle.task = Some(task);
    }
}

struct Follower {
    provider: ProviderHandle,
    cursor: Arc<AtomicU64>,
    token: CancellationToken,
    interval: Duration,
    crash_after_errors: u32,
    signals: SignalSender,
}

impl Follower {
    async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_errors = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.provider.block_number() => result,
            };

            match result {
                Ok(head) => {
                    consecutive_errors = 0;
                    self.advance(head);
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        provider = %self.provider.role(),
                        error = %e,
                        consecutive_errors,
                        "Failed to poll chain head"
                    );
                    if consecutive_errors >= self.crash_after_errors {
                        self.signals.report_error(&e);
                        consecutive_errors = 0;
                    }
                }
            }
        }
    }

    fn advance(&self, head: u64) {
        let previous = self.cursor.swap(head, Ordering::Relaxed);
        let provider = self.provider.role();
        if previous == UNSET {
            tracing::info!(provider = %provider, block = head, "Following chain head");
        } else if head > previous {
            tracing::debug!(provider = %provider, block = head, new_blocks = head - previous, "New chain head");
        } else if head < previous {
            tracing::warn!(provider = %provider, block = head, previous, "Chain head moved backwards");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BlockNumberSource, ProviderError, ProviderResult, ProviderRole};
    use crate::supervisor::{signal, FailureClass, MarkerClassifier};
    use futures_util::future::BoxFuture;
    use url::Url;

    struct Chain {
        head: AtomicU64,
        healthy: std::sync::atomic::AtomicBool,
    }

    impl BlockNumberSource for Chain {
        fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>> {
            Box::pin(async move {
                if self.healthy.load(Ordering::SeqCst) {
                    Ok(self.head.fetch_add(1, Ordering::SeqCst))
                } else {
                    Err(ProviderError::Rpc("connection refused".to_string()))
                }
            })
        }
    }

    fn chain(start: u64, healthy: bool) -> Arc<Chain> {
        Arc::new(Chain {
            head: AtomicU64::new(start),
            healthy: std::sync::atomic::AtomicBool::new(healthy),
        })
    }

    fn handle(source: Arc<Chain>) -> ProviderHandle {
        ProviderHandle::with_source(ProviderRole::Primary, Url::parse("http://localhost:8545").unwrap(), source)
    }

    fn config() -> ListenerConfig {
        ListenerConfig {
            poll_interval_ms: 1000,
            crash_after_errors: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_head_and_resumes_cursor() {
        let (signals, _inbox) = signal::channel(Arc::new(MarkerClassifier::default()));
        let mut poller = BlockPoller::new(config(), signals);
        let source = chain(100, true);

        let mut h = poller.start(&handle(source.clone()));
        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(h.last_block(), Some(102));
        assert!(h.is_running());

        poller.stop(&mut h);
        assert!(!h.is_running());
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.last_block(), Some(102));

        poller.recover(&mut h, &handle(source));
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.last_block(), Some(103));
        poller.stop(&mut h);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_crash_after_consecutive_errors() {
        let (signals, mut inbox) = signal::channel(Arc::new(MarkerClassifier::default()));
        let mut poller = BlockPoller::new(config(), signals);

        let mut h = poller.start(&handle(chain(0, false)));
        let signal = inbox.recv().await.unwrap();
        assert_eq!(signal.class, FailureClass::Generic);
        assert!(signal.reason.contains("connection refused"));
        assert_eq!(h.last_block(), None);
        poller.stop(&mut h);
    }
}
