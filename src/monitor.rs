//! Continuous session monitoring

use std::io::{self, Write};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::display::write_sessions;
use crate::models::SessionRecord;

/// Shared stop flag for a monitoring run.
///
/// Clones observe the same flag. `wait_timeout` wakes as soon as the flag is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`. Returns true if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// What an interrupt did to the monitoring run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// No run in progress
    Idle,
    /// The run was asked to stop
    Cancelled,
    /// The run had already been asked to stop and is still going,
    /// typically stuck in a request that does not answer
    Repeated,
}

impl Interrupt {
    /// Whether the interrupt should end the process instead of the run
    pub fn ends_process(self) -> bool {
        self != Interrupt::Cancelled
    }
}

/// Slot holding the token of the monitoring run in progress, if any.
/// The interrupt handler and the menu share one of these.
#[derive(Debug, Clone, Default)]
pub struct ActiveMonitor {
    slot: Arc<Mutex<Option<CancelToken>>>,
}

impl ActiveMonitor {
    pub fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        token
    }

    pub fn end(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Cancel the running monitor, if any
    pub fn interrupt(&self) -> Interrupt {
        match self.slot.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(token) if token.is_cancelled() => Interrupt::Repeated,
            Some(token) => {
                token.cancel();
                Interrupt::Cancelled
            }
            None => Interrupt::Idle,
        }
    }
}

/// Fetch and print sessions every `interval` until `token` is cancelled.
///
/// Nothing is carried between iterations. A fetch already in flight when the
/// token is cancelled completes and is printed; a second interrupt
/// (`Interrupt::Repeated`) is how a caller escapes a fetch that never returns.
/// Returns the number of iterations run.
pub fn run_monitor<F, W>(
    mut fetch: F,
    interval: Duration,
    token: &CancelToken,
    out: &mut W,
) -> io::Result<usize>
where
    F: FnMut() -> Vec<SessionRecord>,
    W: Write,
{
    let mut iterations = 0;

    while !token.is_cancelled() {
        writeln!(out, "\n=== Current Plex Activity ===")?;
        out.flush()?;

        let sessions = fetch();
        write_sessions(out, &sessions, true)?;
        out.flush()?;
        iterations += 1;

        if token.wait_timeout(interval) {
            break;
        }
    }

    writeln!(out, "\nMonitoring stopped")?;
    Ok(iterations)
}
