//! Shared fakes for supervisor integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chain_watchdog::config::RecoveryConfig;
use chain_watchdog::lifecycle::Shutdown;
use chain_watchdog::provider::{BlockNumberSource, ProviderError, ProviderResult};
use chain_watchdog::supervisor::{signal, MarkerClassifier, SignalSender};
use chain_watchdog::{ListenerLifecycle, ProviderHandle, ProviderPair, ProviderRole, Supervisor, SupervisorStatus};
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Block number source whose health can be flipped at runtime.
pub struct FakeRpc {
    healthy: AtomicBool,
    calls: AtomicU64,
}

impl FakeRpc {
    pub fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(healthy),
            calls: AtomicU64::new(0),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BlockNumberSource for FakeRpc {
    fn block_number(&self) -> BoxFuture<'_, ProviderResult<u64>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let healthy = self.healthy.load(Ordering::SeqCst);
        Box::pin(async move {
            if healthy {
                Ok(1_000 + call)
            } else {
                Err(ProviderError::Rpc("503 Service Unavailable".to_string()))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(ProviderRole),
    Stop,
    Recover(ProviderRole),
}

/// Listener that records every lifecycle call and panics on a double start/stop.
#[derive(Clone, Default)]
pub struct RecordingListener {
    calls: Arc<Mutex<Vec<Call>>>,
    running: Arc<AtomicBool>,
}

impl RecordingListener {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Stop).count()
    }
}

impl ListenerLifecycle for RecordingListener {
    type Handle = ();

    fn start(&mut self, provider: &ProviderHandle) {
        assert!(!self.running.swap(true, Ordering::SeqCst), "listener started twice");
        self.calls.lock().unwrap().push(Call::Start(provider.role()));
    }

    fn stop(&mut self, _handle: &mut ()) {
        assert!(self.running.swap(false, Ordering::SeqCst), "listener stopped twice");
        self.calls.lock().unwrap().push(Call::Stop);
    }

    fn recover(&mut self, _handle: &mut (), provider: &ProviderHandle) {
        assert!(!self.running.swap(true, Ordering::SeqCst), "listener recovered while running");
        self.calls.lock().unwrap().push(Call::Recover(provider.role()));
    }
}

pub struct Harness {
    pub primary: Arc<FakeRpc>,
    pub fallback: Arc<FakeRpc>,
    pub listener: RecordingListener,
    pub signals: SignalSender,
    pub status: watch::Receiver<SupervisorStatus>,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

impl Harness {
    /// Spawn a supervisor with the default recovery settings.
    pub async fn start(primary_healthy: bool, fallback_healthy: bool) -> Self {
        Self::start_with(RecoveryConfig::default(), primary_healthy, fallback_healthy).await
    }

    pub async fn start_with(config: RecoveryConfig, primary_healthy: bool, fallback_healthy: bool) -> Self {
        let primary = FakeRpc::new(primary_healthy);
        let fallback = FakeRpc::new(fallback_healthy);
        let providers = ProviderPair::new(
            handle(ProviderRole::Primary, primary.clone()),
            Some(handle(ProviderRole::Fallback, fallback.clone())),
        );

        let (signals, inbox) = signal::channel(Arc::new(MarkerClassifier::default()));
        let listener = RecordingListener::default();
        let supervisor = Supervisor::new(config, providers, listener.clone(), inbox);
        let mut status = supervisor.status();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(supervisor.run(shutdown.subscribe()));

        status.wait_for(|s| s.listener_running).await.unwrap();

        Self {
            primary,
            fallback,
            listener,
            signals,
            status,
            shutdown,
            task,
        }
    }

    /// Wait (in virtual time) until `pred` holds for the published status.
    pub async fn until(&mut self, pred: impl FnMut(&SupervisorStatus) -> bool) -> SupervisorStatus {
        tokio::time::timeout(Duration::from_secs(3600), self.status.wait_for(pred))
            .await
            .expect("status condition not reached")
            .unwrap()
            .clone()
    }

    pub fn current(&self) -> SupervisorStatus {
        self.status.borrow().clone()
    }

    pub async fn stop(self) -> RecordingListener {
        self.shutdown.trigger();
        self.task.await.unwrap();
        self.listener
    }
}

fn handle(role: ProviderRole, source: Arc<FakeRpc>) -> ProviderHandle {
    let url = format!("http://{}.rpc.test", role).parse().unwrap();
    ProviderHandle::with_source(role, url, source)
}
