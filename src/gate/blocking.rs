//! Thread-blocking admission gate.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::error::AcquireError;

#[derive(Debug, Default)]
struct GateState {
    held: u32,
    draining: u32,
    closed: bool,
}

impl GateState {
    fn admits(&self, capacity: u32) -> bool {
        self.draining == 0 && self.held < capacity
    }
}

/// A counting gate that lets at most `capacity` holders through at once.
///
/// Permits are RAII guards: dropping one (or calling [`Permit::release`])
/// hands the slot back, so a release can never outnumber the acquires.
///
/// [`wait`](Self::wait) is a draining barrier. It stops new admissions, blocks
/// until every outstanding permit has come back, and then leaves the gate
/// empty and ready for the next wave of work.
///
/// # Examples
///
/// ```rust
/// use breakwater::AdmissionGate;
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let gate = Arc::new(AdmissionGate::new(2));
///
/// for _ in 0..4 {
///     let permit = gate.acquire_owned().unwrap();
///     thread::spawn(move || {
///         thread::sleep(Duration::from_millis(10));
///         permit.release();
///     });
/// }
///
/// gate.wait().unwrap();
/// assert_eq!(gate.available(), 2);
/// ```
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: u32,
    state: Mutex<GateState>,
    changed: Condvar,
}

impl AdmissionGate {
    /// Create a gate admitting up to `capacity` concurrent holders.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
        }
    }

    /// Maximum number of concurrent permits.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn held(&self) -> u32 {
        self.lock().held
    }

    /// Number of permits that could be acquired right now.
    ///
    /// Zero while the gate is closed or draining.
    pub fn available(&self) -> u32 {
        let state = self.lock();
        if state.closed || state.draining > 0 {
            0
        } else {
            self.capacity - state.held
        }
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block until a permit is free, then take it.
    pub fn acquire(&self) -> Result<Permit<'_>, AcquireError> {
        let state = self.lock();
        let state = self
            .changed
            .wait_while(state, |s| !s.closed && !s.admits(self.capacity))
            .unwrap_or_else(PoisonError::into_inner);
        self.admit(state)?;
        Ok(Permit { gate: self })
    }

    /// Like [`acquire`](Self::acquire), but the permit keeps the gate alive and
    /// can be moved to another thread.
    pub fn acquire_owned(self: &Arc<Self>) -> Result<OwnedPermit, AcquireError> {
        self.acquire()?.forget();
        Ok(OwnedPermit {
            gate: Arc::clone(self),
        })
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Result<Permit<'_>, AcquireError> {
        let state = self.lock();
        if !state.closed && !state.admits(self.capacity) {
            return Err(AcquireError::NoPermits);
        }
        self.admit(state)?;
        Ok(Permit { gate: self })
    }

    /// Wait up to `timeout` for a permit.
    ///
    /// On timeout the gate is left exactly as it was.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Permit<'_>, AcquireError> {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| !s.closed && !s.admits(self.capacity))
            .unwrap_or_else(PoisonError::into_inner);
        if !state.closed && !state.admits(self.capacity) {
            return Err(AcquireError::Timeout { duration: timeout });
        }
        self.admit(state)?;
        Ok(Permit { gate: self })
    }

    /// Wait until `deadline` for a permit.
    pub fn acquire_until(&self, deadline: Instant) -> Result<Permit<'_>, AcquireError> {
        self.acquire_timeout(deadline.saturating_duration_since(Instant::now()))
    }

    /// Block until every outstanding permit has been released.
    ///
    /// New acquisitions queue up behind the drain and proceed once it
    /// completes. Returns [`AcquireError::Closed`] if the gate is closed
    /// before or during the drain.
    pub fn wait(&self) -> Result<(), AcquireError> {
        let mut state = self.lock();
        if state.closed {
            return Err(AcquireError::Closed);
        }
        state.draining += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(held = state.held, "draining admission gate");

        let mut state = self
            .changed
            .wait_while(state, |s| !s.closed && s.held > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.draining -= 1;
        let closed = state.closed;
        drop(state);
        self.changed.notify_all();

        if closed {
            Err(AcquireError::Closed)
        } else {
            Ok(())
        }
    }

    /// Refuse all further acquisitions and wake everyone waiting.
    ///
    /// Permits already handed out stay valid and are released as usual.
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    fn admit(&self, mut state: MutexGuard<'_, GateState>) -> Result<(), AcquireError> {
        if state.closed {
            return Err(AcquireError::Closed);
        }
        state.held += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(held = state.held, capacity = self.capacity, "permit acquired");

        Ok(())
    }

    fn release(&self) {
        let mut state = self.lock();
        debug_assert!(state.held > 0, "released more permits than were acquired");
        state.held = state.held.saturating_sub(1);

        #[cfg(feature = "tracing")]
        tracing::trace!(held = state.held, capacity = self.capacity, "permit released");

        drop(state);
        self.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A slot in an [`AdmissionGate`], returned to the gate when dropped.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Permit<'_> {
    /// Return the permit to the gate.
    pub fn release(self) {
        drop(self);
    }

    fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A slot in a shared [`AdmissionGate`] that can outlive the borrow it was
/// acquired through.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct OwnedPermit {
    gate: Arc<AdmissionGate>,
}

impl OwnedPermit {
    /// Return the permit to the gate.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for OwnedPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
