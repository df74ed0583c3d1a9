//! Bounded-concurrency admission gates.
//!
//! A gate hands out at most `capacity` permits at a time. Workers hold a permit
//! while they run and give it back when they finish, success or not. A
//! coordinator can [`wait`](AdmissionGate::wait) for the whole wave to drain and
//! then reuse the gate for the next one.
//!
//! # Acquisition Modes
//!
//! - **Blocking**: `acquire` waits as long as it takes
//! - **Non-blocking**: `try_acquire` fails with [`AcquireError::NoPermits`]
//! - **Bounded**: `acquire_timeout` gives up after a deadline
//! - **Select** (async only): [`AsyncAdmissionGate::acquire`] is cancel-safe and
//!   can race other futures in `tokio::select!`
//!
//! Timed-out or refused acquisitions never change the gate's state.

mod blocking;
mod error;

#[cfg(feature = "async")]
mod future;

pub use blocking::{AdmissionGate, OwnedPermit, Permit};
pub use error::AcquireError;

#[cfg(feature = "async")]
pub use future::{AsyncAdmissionGate, AsyncPermit};
