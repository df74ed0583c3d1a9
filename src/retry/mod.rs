//! Retry executors with configurable backoff.
//!
//! This module follows the "pure core, imperative shell" split:
//!
//! - **Pure Core**: [`RetryPolicy`] is just data (attempt count, base delay,
//!   backoff strategy) and computes delays without side effects
//! - **Shell**: [`retry`] and friends invoke the operation, sleep, and collect
//!   failures into a [`RetryError`]
//!
//! # Quick Start
//!
//! ```rust
//! use breakwater::{retry, AttemptError, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::fixed_delay(Duration::from_millis(1)).with_attempts(5);
//! let mut calls = 0;
//!
//! let result = retry(&policy, || {
//!     calls += 1;
//!     if calls < 4 {
//!         Err(AttemptError::from("connection reset"))
//!     } else {
//!         Ok("connected")
//!     }
//! });
//!
//! assert_eq!(result, Ok("connected"));
//! assert_eq!(calls, 4);
//! ```
//!
//! # Backoff Strategies
//!
//! - **Fixed**: Every delay equals the base delay
//! - **Exponential**: Delay doubles each attempt (100ms, 200ms, 400ms, ...)
//! - **Exponential + jitter**: Exponential delay randomized by ±25% (the default)
//!
//! # Stopping Early
//!
//! Two independent ways to stop before attempts run out:
//!
//! - return [`AttemptError::Unrecoverable`] from the operation
//! - pass a predicate to [`retry_if`] that rejects the error
//!
//! # Error Types
//!
//! - [`RetryError`]: Returned when the operation never succeeded
//! - [`TimeoutError`]: Returned by [`retry_with_timeout`] when the deadline passes

mod error;
mod executor;
mod jitter;
mod policy;

#[cfg(feature = "async")]
mod future;

pub use error::{unrecoverable, AttemptError, RetryError, StopReason, TimeoutError};
pub use executor::{retry, retry_if, retry_with_hooks, RetryEvent};
pub use jitter::{jitter, jitter_with};
pub use policy::{Backoff, RetryPolicy};

#[cfg(feature = "async")]
pub use future::{retry_async, retry_async_if, retry_async_with_hooks, retry_with_timeout};
