//! Cooperative shutdown shared between signal listeners and the status loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Termination signals the tool reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    Hangup,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

/// Turns any number of termination signals into one cancellation.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl ShutdownTrigger {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request shutdown. Returns `true` only for the request that actually
    /// flipped the token.
    pub fn trigger(&self, signal: ShutdownSignal) -> bool {
        tracing::info!(%signal, "Caught signal");
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::debug!("Requesting shutdown");
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token observed by the status loop.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
