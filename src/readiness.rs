//! Readiness gate between the transport login and message dispatch.
//!
//! Lifecycle: `NotReady -> Ready -> (Disconnected | AuthFailed) -> Ready`.
//! Dispatch waits for `Ready`; any other state pauses new gateway calls until
//! a later health check succeeds.

use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    NotReady,
    Ready,
    /// Bot API unreachable
    Disconnected,
    /// Token rejected; only a successful re-check reopens the gate
    AuthFailed,
}

/// Cloneable handle to the shared readiness flag
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tx: watch::Sender<Readiness>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::NotReady);
        Self { tx }
    }

    /// Gate that starts open, for setups without a login step
    pub fn ready() -> Self {
        let gate = Self::new();
        gate.mark_ready();
        gate
    }

    pub fn mark_ready(&self) {
        let changed = self.tx.send_if_modified(|state| {
            let was_ready = *state == Readiness::Ready;
            *state = Readiness::Ready;
            !was_ready
        });
        if changed {
            info!("Transport ready, accepting messages");
        }
    }

    pub fn mark_disconnected(&self, reason: &str) {
        if self.close(Readiness::Disconnected) {
            warn!(reason = %reason, "Transport disconnected, pausing dispatch");
        }
    }

    pub fn mark_auth_failure(&self, reason: &str) {
        if self.close(Readiness::AuthFailed) {
            warn!(reason = %reason, "Transport authentication failed, pausing dispatch");
        }
    }

    pub fn state(&self) -> Readiness {
        self.tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow() == Readiness::Ready
    }

    /// Wait until the gate is open; returns immediately when already ready
    pub async fn wait_ready(&self) {
        let mut rx = self.tx.subscribe();
        // Sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|state| *state == Readiness::Ready).await;
    }

    /// Move to a closed state; true when this changed the state
    fn close(&self, next: Readiness) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        })
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
