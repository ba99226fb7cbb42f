//! One-shot return-to-primary timer.

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// A deferred action that fires once after `delay` unless cancelled first.
///
/// Dropping the value cancels it, so replacing the stored timer disarms the old one.
#[derive(Debug)]
pub struct ScheduledReturn {
    generation: u64,
    token: CancellationToken,
}

impl ScheduledReturn {
    pub fn arm<F>(delay: Duration, generation: u64, parent: &CancellationToken, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = parent.child_token();
        let deadline = Instant::now() + delay;
        let wait_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = wait_token.cancelled() => {}
                _ = time::sleep_until(deadline) => on_fire(),
            }
        });
        Self {
            generation,
            token,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for ScheduledReturn {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let timer = ScheduledReturn::arm(Duration::from_secs(60), 1, &CancellationToken::new(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        drop(timer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_disarms_previous() {
        let fired = Arc::new(AtomicU32::new(0));
        let parent = CancellationToken::new();

        let counter = fired.clone();
        let mut pending = Some(ScheduledReturn::arm(Duration::from_secs(10), 1, &parent, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = fired.clone();
        let previous = pending.replace(ScheduledReturn::arm(Duration::from_secs(30), 2, &parent, move || {
            counter.fetch_add(10, Ordering::SeqCst);
        }));
        assert_eq!(previous.map(|t| t.generation()), Some(1));
        assert_eq!(pending.as_ref().map(ScheduledReturn::generation), Some(2));

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancel_disarms() {
        let fired = Arc::new(AtomicU32::new(0));
        let parent = CancellationToken::new();
        let counter = fired.clone();
        let _timer = ScheduledReturn::arm(Duration::from_secs(5), 1, &parent, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        parent.cancel();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
