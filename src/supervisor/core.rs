//! The supervisor loop.
//!
//! Every input (failure signals, probe completions, timer firings, shutdown)
//! is handled one at a time inside a single `select!` loop that exclusively
//! owns [`SupervisorState`] and the listener.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::RecoveryConfig;
use crate::listener::ListenerLifecycle;
use crate::observability::metrics;
use crate::provider::{ProviderPair, ProviderRole};
use crate::supervisor::probe::{ProbeOutcome, ProbeTask, RecoveryProbe};
use crate::supervisor::schedule::ScheduledReturn;
use crate::supervisor::signal::{FailureClass, FailureSignal, SignalInbox};
use crate::supervisor::state::{ListenerSlot, SupervisorState, SupervisorStatus};

/// Completions reported back by spawned probes and timers.
#[derive(Debug)]
enum Internal {
    ProbeFinished {
        class: FailureClass,
        generation: u64,
        outcome: ProbeOutcome,
    },
    ReturnDue {
        generation: u64,
    },
}

/// Keeps a chain listener alive across provider outages.
pub struct Supervisor<L: ListenerLifecycle> {
    config: RecoveryConfig,
    providers: ProviderPair,
    listener: L,
    slot: ListenerSlot<L::Handle>,
    state: SupervisorState,
    inbox: SignalInbox,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    root: CancellationToken,
    status_tx: watch::Sender<SupervisorStatus>,
}

impl<L: ListenerLifecycle> Supervisor<L> {
    pub fn new(config: RecoveryConfig, providers: ProviderPair, listener: L, inbox: SignalInbox) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SupervisorStatus::default());
        Self {
            config,
            providers,
            listener,
            slot: ListenerSlot::new(),
            state: SupervisorState::new(),
            inbox,
            internal_tx,
            internal_rx,
            root: CancellationToken::new(),
            status_tx,
        }
    }

    /// Subscribe to status snapshots.
    pub fn status(&self) -> watch::Receiver<SupervisorStatus> {
        self.status_tx.subscribe()
    }

    /// Start the listener on the primary and supervise until shutdown.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            primary = %self.providers.primary().endpoint(),
            fallback = ?self.providers.fallback().map(|p| p.endpoint().as_str()),
            "Supervisor starting"
        );

        self.resume_listener();
        metrics::set_active_provider(self.state.active_provider);
        self.publish();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Supervisor received shutdown signal, exiting loop");
                    break;
                }
                Some(internal) = self.internal_rx.recv() => self.on_internal(internal),
                Some(signal) = self.inbox.recv() => self.on_signal(signal),
            }
        }

        self.teardown();
    }

    fn on_signal(&mut self, signal: FailureSignal) {
        match signal.class {
            FailureClass::Generic => self.on_generic_crash(&signal.reason),
            FailureClass::Registry => self.on_registry_failure(&signal.reason),
        }
        self.publish();
    }

    fn on_internal(&mut self, internal: Internal) {
        match internal {
            Internal::ProbeFinished {
                class,
                generation,
                outcome,
            } => {
                if self.state.recovery(class).map(|t| t.generation()) != Some(generation) {
                    tracing::debug!(class = %class, generation, "Discarding stale probe result");
                    return;
                }
                match (class, outcome) {
                    (FailureClass::Generic, ProbeOutcome::Recovered) => self.on_generic_recovered(),
                    (FailureClass::Generic, ProbeOutcome::Exhausted) => self.on_candidate_exhausted(),
                    (FailureClass::Registry, _) => self.on_registry_recovered(),
                }
            }
            Internal::ReturnDue { generation } => {
                if self.state.pending_return.as_ref().map(|t| t.generation()) != Some(generation) {
                    tracing::debug!(generation, "Discarding stale return timer");
                    return;
                }
                self.state.pending_return = None;
                self.on_return_due();
            }
        }
        self.publish();
    }

    fn on_generic_crash(&mut self, reason: &str) {
        if self.state.generic_recovery.is_some() {
            tracing::debug!(reason, "Generic recovery already in flight, absorbing crash signal");
            metrics::record_signal(FailureClass::Generic.as_str(), "absorbed");
            return;
        }

        tracing::warn!(
            reason,
            provider = %self.state.active_provider,
            "Provider crash detected, stopping listener"
        );
        metrics::record_signal(FailureClass::Generic.as_str(), "accepted");

        // recovery decides again whether a return timer is needed
        self.state.pending_return = None;
        self.state.failover_switches = 0;
        self.stop_listener();
        self.start_generic_probe(self.state.active_provider);
    }

    fn on_registry_failure(&mut self, reason: &str) {
        if self.state.registry_recovery.is_some() {
            tracing::debug!(reason, "Registry recovery already in flight, absorbing signal");
            metrics::record_signal(FailureClass::Registry.as_str(), "absorbed");
            return;
        }

        tracing::warn!(reason, "Transaction registry failure detected, stopping listener");
        metrics::record_signal(FailureClass::Registry.as_str(), "accepted");

        self.stop_listener();
        let probe = RecoveryProbe::new(
            self.providers.primary().clone(),
            self.poll_interval(),
            self.config.success_threshold,
        );
        let task = self.spawn_probe(FailureClass::Registry, probe);
        self.state.registry_recovery = Some(task);
        self.state.registry_probes_started += 1;
    }

    fn on_generic_recovered(&mut self) {
        let Some(task) = self.state.generic_recovery.take() else {
            return;
        };
        let target = task.target();
        drop(task);

        self.state.active_provider = target;
        self.state.using_fallback = target == ProviderRole::Fallback;
        metrics::record_recovery(FailureClass::Generic.as_str(), target);
        metrics::set_active_provider(target);
        tracing::info!(provider = %target, "Provider recovered");

        if self.state.registry_recovery.is_some() {
            tracing::info!("Registry recovery still in flight, deferring listener resume");
        } else {
            self.resume_listener();
        }

        if self.state.using_fallback {
            self.arm_return_timer();
        }
    }

    fn on_candidate_exhausted(&mut self) {
        let Some(task) = self.state.generic_recovery.take() else {
            return;
        };
        let next = task.target().other();
        drop(task);

        self.state.failover_switches += 1;
        self.state.active_provider = next;
        metrics::record_failover(next);
        tracing::warn!(
            from = %next.other(),
            to = %next,
            switches = self.state.failover_switches,
            "Failover candidate exhausted, switching endpoint"
        );
        self.start_generic_probe(next);
    }

    fn on_registry_recovered(&mut self) {
        self.state.registry_recovery = None;
        metrics::record_recovery(FailureClass::Registry.as_str(), ProviderRole::Primary);
        tracing::info!("Transaction registry recovered");

        if self.state.generic_recovery.is_some() {
            tracing::info!("Generic recovery still in flight, deferring listener resume");
        } else {
            self.resume_listener();
        }
    }

    fn on_return_due(&mut self) {
        if self.state.generic_recovery.is_some() || !self.state.using_fallback {
            tracing::debug!("Return timer fired outside of fallback operation, ignoring");
            return;
        }

        tracing::info!("Return-to-primary timer fired, leaving fallback");
        self.stop_listener();
        self.state.failover_switches = 0;
        self.state.active_provider = ProviderRole::Primary;
        self.state.using_fallback = false;
        metrics::set_active_provider(ProviderRole::Primary);
        self.start_generic_probe(ProviderRole::Primary);
    }

    fn start_generic_probe(&mut self, target: ProviderRole) {
        let mut probe = RecoveryProbe::new(
            self.providers.get(target).clone(),
            self.poll_interval(),
            self.config.success_threshold,
        );
        if self.providers.has_fallback() {
            probe = probe.with_failover(self.config.failure_threshold);
        }
        let task = self.spawn_probe(FailureClass::Generic, probe);
        // replacing the guard cancels any previous probe
        self.state.generic_recovery = Some(task);
        self.state.generic_probes_started += 1;
    }

    fn spawn_probe(&mut self, class: FailureClass, probe: RecoveryProbe) -> ProbeTask {
        let generation = self.state.next_generation();
        let tx = self.internal_tx.clone();
        probe.spawn(generation, &self.root, move |outcome| {
            let _ = tx.send(Internal::ProbeFinished {
                class,
                generation,
                outcome,
            });
        })
    }

    fn arm_return_timer(&mut self) {
        let generation = self.state.next_generation();
        let delay = Duration::from_secs(self.config.return_to_primary_delay_secs);
        let tx = self.internal_tx.clone();
        tracing::info!(delay_secs = delay.as_secs(), "Return-to-primary timer armed");
        self.state.pending_return = Some(ScheduledReturn::arm(delay, generation, &self.root, move || {
            let _ = tx.send(Internal::ReturnDue { generation });
        }));
    }

    fn stop_listener(&mut self) {
        if let Some(handle) = self.slot.take_running() {
            self.listener.stop(handle);
        }
    }

    fn resume_listener(&mut self) {
        if self.slot.is_running() {
            tracing::warn!("Listener already running, not resuming");
            return;
        }
        let provider = self.providers.get(self.state.active_provider);
        if let Some(handle) = self.slot.take_stopped() {
            self.listener.recover(handle, provider);
        } else {
            let handle = self.listener.start(provider);
            self.slot.started(handle);
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.state.snapshot(self.slot.is_running()));
    }

    fn teardown(&mut self) {
        self.root.cancel();
        self.state.generic_recovery = None;
        self.state.registry_recovery = None;
        self.state.pending_return = None;
        self.stop_listener();

        let mut status = self.state.snapshot(self.slot.is_running());
        status.shut_down = true;
        self.status_tx.send_replace(status);
        tracing::info!("Supervisor stopped");
    }
}
