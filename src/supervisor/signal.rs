//! Failure signals delivered to the supervisor.
//!
//! Callers either report a typed signal (`report_crash`,
//! `report_registry_failure`) or hand over an opaque error and let the
//! configured [`FailureClassifier`] decide whether it is worth escalating.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ClassifierConfig;

/// The two independently recovered failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The active provider connection is unusable.
    Generic,
    /// The transaction registry reported a fault.
    Registry,
}

impl FailureClass {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Generic => "generic",
            FailureClass::Registry => "registry",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSignal {
    pub class: FailureClass,
    pub reason: String,
}

/// Decides whether an opaque error is a provider crash, a registry failure,
/// or noise to be ignored.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, message: &str) -> Option<FailureClass>;
}

/// Case-insensitive substring matching on the rendered error.
///
/// Registry markers win over crash markers. An empty crash marker list
/// escalates every error that is not a registry failure.
#[derive(Debug, Clone, Default)]
pub struct MarkerClassifier {
    crash_markers: Vec<String>,
    registry_markers: Vec<String>,
}

impl MarkerClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            crash_markers: lowercase(&config.crash_markers),
            registry_markers: lowercase(&config.registry_markers),
        }
    }
}

fn lowercase(markers: &[String]) -> Vec<String> {
    markers.iter().map(|m| m.to_lowercase()).collect()
}

impl FailureClassifier for MarkerClassifier {
    fn classify(&self, message: &str) -> Option<FailureClass> {
        let message = message.to_lowercase();
        if self.registry_markers.iter().any(|m| message.contains(m.as_str())) {
            return Some(FailureClass::Registry);
        }
        if self.crash_markers.is_empty() || self.crash_markers.iter().any(|m| message.contains(m.as_str())) {
            return Some(FailureClass::Generic);
        }
        None
    }
}

/// Sending half, cheap to clone. Handed to listeners and any other code
/// that observes provider faults.
#[derive(Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<FailureSignal>,
    classifier: Arc<dyn FailureClassifier>,
}

impl SignalSender {
    /// Report that the active provider crashed.
    ///
    /// Returns `false` once the supervisor has shut down.
    pub fn report_crash(&self, reason: impl Into<String>) -> bool {
        self.send(FailureClass::Generic, reason.into())
    }

    /// Report a transaction registry failure.
    pub fn report_registry_failure(&self, reason: impl Into<String>) -> bool {
        self.send(FailureClass::Registry, reason.into())
    }

    /// Classify an opaque error and report it if it matches.
    pub fn report_error(&self, error: &dyn std::error::Error) -> Option<FailureClass> {
        let reason = error.to_string();
        match self.classifier.classify(&reason) {
            Some(class) => {
                self.send(class, reason);
                Some(class)
            }
            None => {
                tracing::debug!(error = %reason, "Error did not match any failure marker, ignoring");
                None
            }
        }
    }

    fn send(&self, class: FailureClass, reason: String) -> bool {
        self.tx.send(FailureSignal { class, reason }).is_ok()
    }
}

/// Receiving half, owned by the supervisor.
pub struct SignalInbox {
    rx: mpsc::UnboundedReceiver<FailureSignal>,
}

impl SignalInbox {
    pub async fn recv(&mut self) -> Option<FailureSignal> {
        self.rx.recv().await
    }
}

/// Create a signal channel using `classifier` for [`SignalSender::report_error`].
pub fn channel(classifier: Arc<dyn FailureClassifier>) -> (SignalSender, SignalInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender { tx, classifier }, SignalInbox { rx })
}
