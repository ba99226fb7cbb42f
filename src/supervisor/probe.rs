//! Recovery probing.
//!
//! # Responsibilities
//! - Poll a provider's liveness on a fixed cadence
//! - Declare recovery after N consecutive successes
//! - In failover mode, give up on a candidate after M consecutive failures
//!
//! # Design Decisions
//! - Any failure resets the success streak (flaky links never count as recovered)
//! - Cancellation yields no outcome
//! - A spawned probe is owned by a [`ProbeTask`] guard; dropping the guard cancels it

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::provider::{ProviderHandle, ProviderRole};

/// How a probe finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The target answered `success_threshold` times in a row.
    Recovered,
    /// The target failed `failure_threshold` times in a row (failover mode only).
    Exhausted,
}

/// Counting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// Count successes only; wait forever.
    Confirm,
    /// Count successes and failures; report exhaustion so the caller can switch candidates.
    Failover { failure_threshold: u32 },
}

/// Consecutive success/failure bookkeeping for one probe.
#[derive(Debug, Clone)]
pub struct Streak {
    success_threshold: u32,
    mode: ProbeMode,
    successes: u32,
    failures: u32,
}

impl Streak {
    pub fn new(success_threshold: u32, mode: ProbeMode) -> Self {
        Self {
            success_threshold,
            mode,
            successes: 0,
            failures: 0,
        }
    }

    /// Feed one probe result.
    pub fn observe(&mut self, healthy: bool) -> Option<ProbeOutcome> {
        if healthy {
            self.failures = 0;
            self.successes += 1;
            if self.successes >= self.success_threshold {
                return Some(ProbeOutcome::Recovered);
            }
            return None;
        }

        self.successes = 0;
        match self.mode {
            ProbeMode::Confirm => None,
            ProbeMode::Failover { failure_threshold } => {
                self.failures += 1;
                (self.failures >= failure_threshold).then_some(ProbeOutcome::Exhausted)
            }
        }
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// A single recovery attempt against one provider.
#[derive(Debug, Clone)]
pub struct RecoveryProbe {
    target: ProviderHandle,
    poll_interval: Duration,
    success_threshold: u32,
    mode: ProbeMode,
}

impl RecoveryProbe {
    pub fn new(target: ProviderHandle, poll_interval: Duration, success_threshold: u32) -> Self {
        Self {
            target,
            poll_interval,
            success_threshold,
            mode: ProbeMode::Confirm,
        }
    }

    /// Also count failures and stop with [`ProbeOutcome::Exhausted`].
    pub fn with_failover(mut self, failure_threshold: u32) -> Self {
        self.mode = ProbeMode::Failover { failure_threshold };
        self
    }

    pub fn target(&self) -> &ProviderHandle {
        &self.target
    }

    /// Poll until an outcome is reached. Returns `None` if cancelled.
    ///
    /// Every probe, including the first, waits one `poll_interval`.
    pub async fn run(self, token: CancellationToken) -> Option<ProbeOutcome> {
        let provider = self.target.role();
        let mut streak = Streak::new(self.success_threshold, self.mode);
        let mut ticker = time::interval_at(time::Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            provider = %provider,
            endpoint = %self.target.endpoint(),
            mode = ?self.mode,
            "Recovery probe started"
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let healthy = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = self.target.probe() => result.is_ok(),
            };

            let outcome = streak.observe(healthy);
            tracing::debug!(
                provider = %provider,
                healthy,
                successes = streak.successes(),
                failures = streak.failures(),
                "Recovery probe tick"
            );

            if let Some(outcome) = outcome {
                tracing::info!(provider = %provider, ?outcome, "Recovery probe finished");
                return Some(outcome);
            }
        }

        tracing::debug!(provider = %provider, "Recovery probe cancelled");
        None
    }

    /// Run on the Tokio runtime under a child of `parent`.
    ///
    /// `on_done` is only called when the probe reaches an outcome, never on cancellation.
    pub fn spawn<F>(self, generation: u64, parent: &CancellationToken, on_done: F) -> ProbeTask
    where
        F: FnOnce(ProbeOutcome) + Send + 'static,
    {
        let token = parent.child_token();
        let target = self.target.role();
        let run_token = token.clone();
        tokio::spawn(async move {
            if let Some(outcome) = self.run(run_token).await {
                on_done(outcome);
            }
        });
        ProbeTask {
            generation,
            target,
            token,
        }
    }
}

/// Ownership guard for a spawned probe.
#[derive(Debug)]
pub struct ProbeTask {
    generation: u64,
    target: ProviderRole,
    token: CancellationToken,
}

impl ProbeTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn target(&self) -> ProviderRole {
        self.target
    }
}

impl Drop for ProbeTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BlockNumberSource, ProviderError, ProviderResult};
    use futures_util::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use url::Url;

    /// Replays a fixed script, then repeats the last entry.
    struct Scripted(Mutex<VecDeque<bool>>);

    impl BlockNumberSource for Scripted {
        fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>> {
            let mut script = self.0.lock().unwrap();
            let healthy = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().copied().unwrap_or(false)
            };
            Box::pin(async move {
                if healthy {
                    Ok(1)
                } else {
                    Err(ProviderError::Rpc("down".to_string()))
                }
            })
        }
    }

    fn probe(script: &[bool]) -> RecoveryProbe {
        let source = Arc::new(Scripted(Mutex::new(script.iter().copied().collect())));
        let handle = ProviderHandle::with_source(
            ProviderRole::Primary,
            Url::parse("http://localhost:8545").unwrap(),
            source,
        );
        RecoveryProbe::new(handle, Duration::from_millis(2000), 5)
    }

    #[test]
    fn test_streak_requires_consecutive_successes() {
        let mut streak = Streak::new(5, ProbeMode::Confirm);
        for _ in 0..4 {
            assert_eq!(streak.observe(true), None);
        }
        assert_eq!(streak.observe(false), None);
        assert_eq!(streak.successes(), 0);
        for _ in 0..4 {
            assert_eq!(streak.observe(true), None);
        }
        assert_eq!(streak.observe(true), Some(ProbeOutcome::Recovered));
    }

    #[test]
    fn test_confirm_mode_never_exhausts() {
        let mut streak = Streak::new(5, ProbeMode::Confirm);
        for _ in 0..100 {
            assert_eq!(streak.observe(false), None);
        }
        assert_eq!(streak.failures(), 0);
    }

    #[test]
    fn test_failover_mode_exhausts_at_threshold() {
        let mut streak = Streak::new(5, ProbeMode::Failover { failure_threshold: 5 });
        for _ in 0..4 {
            assert_eq!(streak.observe(false), None);
        }
        assert_eq!(streak.observe(true), None);
        assert_eq!(streak.failures(), 0);
        for _ in 0..4 {
            assert_eq!(streak.observe(false), None);
        }
        assert_eq!(streak.observe(false), Some(ProbeOutcome::Exhausted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_five_intervals() {
        let start = time::Instant::now();
        let outcome = probe(&[true]).run(CancellationToken::new()).await;
        assert_eq!(outcome, Some(ProbeOutcome::Recovered));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_restarts_streak_after_failure() {
        let start = time::Instant::now();
        let outcome = probe(&[true, true, true, false, true]).run(CancellationToken::new()).await;
        assert_eq!(outcome, Some(ProbeOutcome::Recovered));
        // failure on tick 4 (t=8s), then five more successes
        assert_eq!(start.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_failover_exhausts() {
        let start = time::Instant::now();
        let outcome = probe(&[false]).with_failover(5).run(CancellationToken::new()).await;
        assert_eq!(outcome, Some(ProbeOutcome::Exhausted));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    /// Counts calls and always answers.
    struct Counting(AtomicUsize);

    impl BlockNumberSource for Counting {
        fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(1) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_waits_one_interval() {
        let source = Arc::new(Counting(AtomicUsize::new(0)));
        let handle = ProviderHandle::with_source(
            ProviderRole::Primary,
            Url::parse("http://localhost:8545").unwrap(),
            source.clone(),
        );
        let token = CancellationToken::new();
        let running = tokio::spawn(RecoveryProbe::new(handle, Duration::from_millis(2000), 5).run(token.clone()));

        time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(source.0.load(Ordering::SeqCst), 0, "no check before one full interval");

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(source.0.load(Ordering::SeqCst), 1);

        token.cancel();
        assert_eq!(running.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_yields_nothing() {
        let token = CancellationToken::new();
        let running = tokio::spawn(probe(&[false]).run(token.clone()));
        time::sleep(Duration::from_secs(30)).await;
        token.cancel();
        assert_eq!(running.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_task_cancels_probe() {
        let parent = CancellationToken::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let task = probe(&[true]).spawn(7, &parent, move |outcome| {
            let _ = tx.send(outcome);
        });
        assert_eq!(task.generation(), 7);
        assert_eq!(task.target(), ProviderRole::Primary);

        drop(task);
        time::sleep(Duration::from_secs(60)).await;
        assert!(rx.recv().await.is_none());
    }
}
