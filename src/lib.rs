//! # Breakwater
//!
//! > *Hold back the waves*
//!
//! Two small primitives for hardening unreliable work:
//!
//! - **Retry executors** re-run a fallible operation under a [`RetryPolicy`]
//!   (fixed, exponential, or jittered exponential backoff) until it succeeds,
//!   runs out of attempts, or fails in a way that isn't worth retrying.
//! - **Admission gates** cap how many operations run at once and let a
//!   coordinator wait for all outstanding work to drain.
//!
//! The two are independent; use either on its own.
//!
//! ## Quick Example
//!
//! ```rust
//! use breakwater::{retry, AdmissionGate, AttemptError, RetryPolicy};
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let gate = Arc::new(AdmissionGate::new(4));
//! let policy = RetryPolicy::exponential_jitter(Duration::from_millis(1)).with_attempts(3);
//!
//! for id in 0..8u32 {
//!     let permit = gate.acquire_owned().unwrap();
//!     let policy = policy.clone();
//!     thread::spawn(move || {
//!         let _ = retry(&policy, || {
//!             if id % 2 == 0 {
//!                 Ok(id)
//!             } else {
//!                 Err(AttemptError::from("odd ids are flaky"))
//!             }
//!         });
//!         permit.release();
//!     });
//! }
//!
//! gate.wait().unwrap();
//! ```
//!
//! ## Features
//!
//! - `async`: tokio-based `retry_async` family and `AsyncAdmissionGate`
//! - `tracing`: emit `tracing` events from the executors and gates
//! - `serde`: (de)serialize [`RetryPolicy`] from configuration
//!
//! For more, see the `demos` directory.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod gate;
pub mod retry;

// Re-exports
pub use gate::{AcquireError, AdmissionGate, OwnedPermit, Permit};
pub use retry::{
    retry, retry_if, retry_with_hooks, unrecoverable, AttemptError, Backoff, RetryError,
    RetryEvent, RetryPolicy, StopReason, TimeoutError,
};

#[cfg(feature = "async")]
pub use gate::{AsyncAdmissionGate, AsyncPermit};
#[cfg(feature = "async")]
pub use retry::{retry_async, retry_async_if, retry_async_with_hooks, retry_with_timeout};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::gate::{AcquireError, AdmissionGate};
    pub use crate::retry::{retry, retry_if, AttemptError, Backoff, RetryError, RetryPolicy};

    #[cfg(feature = "async")]
    pub use crate::gate::AsyncAdmissionGate;
    #[cfg(feature = "async")]
    pub use crate::retry::{retry_async, retry_async_if};
}
