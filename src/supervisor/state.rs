//! Supervisor state and its published snapshot.
//!
//! # States
//! - NormalPrimary: listener running on the primary
//! - NormalFallback: listener running on the fallback (return timer armed)
//! - RecoveringGeneric(target): listener stopped, probing `target` after a crash
//! - RecoveringRegistry: listener stopped, probing the primary after a registry fault
//!
//! # State Transitions
//! ```text
//! Normal*            → RecoveringGeneric(active):  generic crash signal
//! RecoveringGeneric  → RecoveringGeneric(other):   candidate exhausted (failover only)
//! RecoveringGeneric  → NormalPrimary:              probe on primary recovered
//! RecoveringGeneric  → NormalFallback:             probe on fallback recovered, timer armed
//! NormalFallback     → RecoveringGeneric(primary): return timer fired
//! any                → RecoveringRegistry overlay: registry signal (independent probe)
//! ```

use crate::provider::ProviderRole;
use crate::supervisor::probe::ProbeTask;
use crate::supervisor::schedule::ScheduledReturn;
use crate::supervisor::signal::FailureClass;

/// Coarse supervisor phase, derived from [`SupervisorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NormalPrimary,
    NormalFallback,
    RecoveringGeneric(ProviderRole),
    RecoveringRegistry,
}

/// Point-in-time view of the supervisor, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorStatus {
    pub phase: Phase,
    pub active_provider: ProviderRole,
    pub using_fallback: bool,
    pub generic_recovery: bool,
    pub registry_recovery: bool,
    pub return_armed: bool,
    pub listener_running: bool,
    pub generic_probes_started: u64,
    pub registry_probes_started: u64,
    pub failover_switches: u32,
    pub shut_down: bool,
}

impl Default for SupervisorStatus {
    fn default() -> Self {
        Self {
            phase: Phase::NormalPrimary,
            active_provider: ProviderRole::Primary,
            using_fallback: false,
            generic_recovery: false,
            registry_recovery: false,
            return_armed: false,
            listener_running: false,
            generic_probes_started: 0,
            registry_probes_started: 0,
            failover_switches: 0,
            shut_down: false,
        }
    }
}

/// Mutable supervisor record. Owned by the supervisor loop only.
#[derive(Debug)]
pub struct SupervisorState {
    pub active_provider: ProviderRole,
    pub using_fallback: bool,
    pub generic_recovery: Option<ProbeTask>,
    pub registry_recovery: Option<ProbeTask>,
    /// Candidate switches since the last crash or forced return.
    pub failover_switches: u32,
    pub pending_return: Option<ScheduledReturn>,
    pub generic_probes_started: u64,
    pub registry_probes_started: u64,
    next_generation: u64,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self {
            active_provider: ProviderRole::Primary,
            using_fallback: false,
            generic_recovery: None,
            registry_recovery: None,
            failover_switches: 0,
            pending_return: None,
            generic_probes_started: 0,
            registry_probes_started: 0,
            next_generation: 0,
        }
    }

    /// Fresh id for a probe or timer; completions carrying an older id are stale.
    pub fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    pub fn recovery(&self, class: FailureClass) -> Option<&ProbeTask> {
        match class {
            FailureClass::Generic => self.generic_recovery.as_ref(),
            FailureClass::Registry => self.registry_recovery.as_ref(),
        }
    }

    /// Whether any recovery currently needs the listener stopped.
    pub fn recovering(&self) -> bool {
        self.generic_recovery.is_some() || self.registry_recovery.is_some()
    }

    pub fn phase(&self) -> Phase {
        if let Some(task) = &self.generic_recovery {
            Phase::RecoveringGeneric(task.target())
        } else if self.registry_recovery.is_some() {
            Phase::RecoveringRegistry
        } else if self.using_fallback {
            Phase::NormalFallback
        } else {
            Phase::NormalPrimary
        }
    }

    pub fn snapshot(&self, listener_running: bool) -> SupervisorStatus {
        SupervisorStatus {
            phase: self.phase(),
            active_provider: self.active_provider,
            using_fallback: self.using_fallback,
            generic_recovery: self.generic_recovery.is_some(),
            registry_recovery: self.registry_recovery.is_some(),
            return_armed: self.pending_return.is_some(),
            listener_running,
            generic_probes_started: self.generic_probes_started,
            registry_probes_started: self.registry_probes_started,
            failover_switches: self.failover_switches,
            shut_down: false,
        }
    }
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener handle plus its running flag.
///
/// Enforces "never double-started, never double-stopped".
#[derive(Debug)]
pub struct ListenerSlot<H> {
    handle: Option<H>,
    running: bool,
}

impl<H> ListenerSlot<H> {
    pub fn new() -> Self {
        Self {
            handle: None,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mutable handle of a running listener, if any. Marks it stopped.
    pub fn take_running(&mut self) -> Option<&mut H> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.handle.as_mut()
    }

    /// Mutable handle of a stopped listener, if one was ever started. Marks it running.
    pub fn take_stopped(&mut self) -> Option<&mut H> {
        if self.running || self.handle.is_none() {
            return None;
        }
        self.running = true;
        self.handle.as_mut()
    }

    /// Store a freshly started handle.
    pub fn started(&mut self, handle: H) {
        self.handle = Some(handle);
        self.running = true;
    }
}

impl<H> Default for ListenerSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}
