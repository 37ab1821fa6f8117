//! Per-call cancellation and deadline handle.
//!
//! # Responsibility
//! - Carry a cancel signal from the caller down to the storage call.
//!
//! # Invariants
//! - Clones share one cancel flag; cancelling any clone cancels all.
//! - A done context never becomes live again.

use crate::error::{ErrorKind, ResourceError, ResourceResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation handle threaded through decorators, service and repository.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context without deadline; only an explicit `cancel` ends it.
    pub fn background() -> Self {
        Self::default()
    }

    /// Timeouts too large to represent as an `Instant` leave the context
    /// unbounded.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the call should stop: cancelled or past deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails with `Cancelled` once the context is done.
    pub fn check(&self) -> ResourceResult<()> {
        if self.is_cancelled() {
            return Err(ResourceError::with_detail(
                ErrorKind::Cancelled,
                "cancelled by caller",
            ));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ResourceError::with_detail(
                ErrorKind::Cancelled,
                "deadline exceeded",
            ));
        }
        Ok(())
    }
}
