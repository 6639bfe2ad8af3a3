//! Stop conditions for the improvement loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How the improvement loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No candidate move improves the total cost.
    Converged,
    /// The iteration cap was hit.
    CapReached,
    /// Cancelled or out of time; the best-known solution is returned.
    Cancelled,
}

/// Cloneable flag a host can flip to stop a running solve.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Cancellation token plus an optional wall-clock deadline.
#[derive(Debug, Clone)]
pub struct StopSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub fn new(token: CancellationToken, time_limit: Option<Duration>) -> Self {
        Self {
            token,
            deadline: time_limit.map(|limit| Instant::now() + limit),
        }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    pub fn should_stop(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
