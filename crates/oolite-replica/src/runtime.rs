//! Node runtime state: the crash/recovery simulation.
//!
//! A crashed node refuses every remote operation except identity resolution
//! and the crash control itself. Crashing schedules an automatic return to
//! available: the deadline is stored and compared at every admission check,
//! so no timer thread is involved and the flag is never shared raw with
//! other subsystems — callers only ever see [`RuntimeState::check_available`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{ReplicaError, Result};

/// Binary available/crashed state with a scheduled return to available.
#[derive(Debug, Default)]
pub struct RuntimeState {
    crashed_until: Mutex<Option<Instant>>,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the node to crashed for `duration`; fails if already crashed.
    pub fn crash(&self, duration: Duration) -> Result<()> {
        let mut slot = lock(&self.crashed_until);
        let now = Instant::now();
        if matches!(*slot, Some(deadline) if now < deadline) {
            return Err(ReplicaError::AlreadyCrashed);
        }
        *slot = Some(now + duration);
        Ok(())
    }

    /// Admission check: `Err(Unavailable)` while crashed. Reverts the state
    /// to available once the crash deadline has elapsed.
    pub fn check_available(&self) -> Result<()> {
        let mut slot = lock(&self.crashed_until);
        match *slot {
            Some(deadline) if Instant::now() < deadline => Err(ReplicaError::Unavailable),
            Some(_) => {
                *slot = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// True iff the node is currently crashed.
    pub fn is_crashed(&self) -> bool {
        self.check_available().is_err()
    }
}

fn lock(mutex: &Mutex<Option<Instant>>) -> std::sync::MutexGuard<'_, Option<Instant>> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
