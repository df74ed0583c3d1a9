//! Blocking retry executor.
//!
//! The loop runs on the caller's thread and sleeps between attempts with
//! [`std::thread::sleep`]; those sleeps can't be interrupted. Enforce an overall
//! deadline around the call, or use the `async` executors, which cancel cleanly.

use std::time::{Duration, Instant};

use super::error::{AttemptError, RetryError, StopReason};
use super::policy::RetryPolicy;

/// Information about a failed attempt, passed to hooks before the next one.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt.
    pub next_delay: Duration,
    /// Total elapsed time since first attempt.
    pub elapsed: Duration,
}

pub(crate) enum Step<E> {
    Retry(Duration),
    Stop(RetryError<E>),
}

/// Bookkeeping for one call to an executor: counts attempts, keeps the failures
/// the policy wants kept, and decides whether to go again.
pub(crate) struct Attempts<'p, E> {
    policy: &'p RetryPolicy,
    earlier: Vec<E>,
    failed: u32,
    start: Instant,
}

impl<'p, E> Attempts<'p, E> {
    pub(crate) fn new(policy: &'p RetryPolicy) -> Self {
        let capacity = if policy.records_all_attempts() {
            usize::try_from(policy.attempts()).unwrap_or(0).saturating_sub(1)
        } else {
            0
        };
        Self {
            policy,
            earlier: Vec::with_capacity(capacity),
            failed: 0,
            start: Instant::now(),
        }
    }

    pub(crate) fn fail<P, H>(
        &mut self,
        error: AttemptError<E>,
        should_retry: &P,
        on_retry: &mut H,
    ) -> Step<E>
    where
        P: Fn(&E) -> bool,
        H: FnMut(&RetryEvent<'_, E>),
    {
        let unrecoverable = error.is_unrecoverable();
        let error = error.into_inner();
        let attempt = self.failed + 1;

        let stop = if attempt >= self.policy.attempts() {
            Some(StopReason::Exhausted)
        } else if unrecoverable {
            Some(StopReason::Unrecoverable)
        } else if !should_retry(&error) {
            Some(StopReason::NotRetryable)
        } else {
            None
        };

        if let Some(reason) = stop {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempts = attempt, %reason, "giving up on operation");

            let elapsed = self.start.elapsed();
            let err = if self.policy.records_all_attempts() {
                RetryError::all(std::mem::take(&mut self.earlier), error, reason, elapsed)
            } else {
                RetryError::last(error, attempt, reason, elapsed)
            };
            return Step::Stop(err);
        }

        let delay = self.policy.delay_for_attempt(self.failed);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "attempt failed, retrying"
        );

        on_retry(&RetryEvent {
            attempt,
            error: &error,
            next_delay: delay,
            elapsed: self.start.elapsed(),
        });

        if self.policy.records_all_attempts() {
            self.earlier.push(error);
        }
        self.failed = attempt;
        Step::Retry(delay)
    }

    pub(crate) fn succeeded(&self) {
        #[cfg(feature = "tracing")]
        {
            if self.failed > 0 {
                tracing::debug!(attempts = self.failed + 1, "operation succeeded after retrying");
            }
        }
    }
}

/// Retry an operation until it succeeds or the policy gives up.
///
/// Every error is treated as retryable unless the operation marks it
/// [`AttemptError::Unrecoverable`]. Blocks the calling thread for the
/// cumulative backoff.
///
/// # Example
///
/// ```rust
/// use breakwater::{retry, AttemptError, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed_delay(Duration::from_millis(1)).with_attempts(5);
/// let mut calls = 0;
///
/// let value = retry(&policy, || {
///     calls += 1;
///     if calls < 3 {
///         return Err(AttemptError::from("not yet"));
///     }
///     Ok(calls)
/// });
///
/// assert_eq!(value, Ok(3));
/// ```
pub fn retry<T, E, F>(policy: &RetryPolicy, operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
{
    retry_with_hooks(policy, operation, |_| true, |_| {})
}

/// Retry only when the predicate returns true for the error.
///
/// Non-retryable errors stop the loop after the attempt that produced them.
///
/// # Example
///
/// ```rust
/// use breakwater::{retry_if, AttemptError, RetryPolicy, StopReason};
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq)]
/// enum AppError { Transient, Permanent }
///
/// let policy = RetryPolicy::fixed_delay(Duration::from_millis(1)).with_attempts(5);
///
/// let err = retry_if(
///     &policy,
///     || Err::<(), _>(AttemptError::from(AppError::Permanent)),
///     |e| *e == AppError::Transient,
/// )
/// .unwrap_err();
///
/// assert_eq!(err.attempts(), 1);
/// assert_eq!(err.reason(), StopReason::NotRetryable);
/// ```
pub fn retry_if<T, E, F, P>(
    policy: &RetryPolicy,
    operation: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    P: Fn(&E) -> bool,
{
    retry_with_hooks(policy, operation, should_retry, |_| {})
}

/// Retry with a predicate and a hook for observability.
///
/// `on_retry` runs after each failed attempt that will be retried, right
/// before the delay. Use it for logging or metrics; it runs on the retrying
/// thread, so keep it quick.
///
/// # Example
///
/// ```rust
/// use breakwater::{retry_with_hooks, AttemptError, RetryEvent, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential(Duration::from_millis(1)).with_attempts(3);
/// let mut delays = Vec::new();
///
/// let _ = retry_with_hooks(
///     &policy,
///     || Err::<(), _>(AttemptError::from("down")),
///     |_| true,
///     |event: &RetryEvent<'_, &str>| delays.push(event.next_delay),
/// );
///
/// assert_eq!(delays, vec![Duration::from_millis(1), Duration::from_millis(2)]);
/// ```
pub fn retry_with_hooks<T, E, F, P, H>(
    policy: &RetryPolicy,
    mut operation: F,
    should_retry: P,
    mut on_retry: H,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    P: Fn(&E) -> bool,
    H: FnMut(&RetryEvent<'_, E>),
{
    let mut attempts = Attempts::new(policy);
    loop {
        match operation() {
            Ok(value) => {
                attempts.succeeded();
                return Ok(value);
            }
            Err(error) => match attempts.fail(error, &should_retry, &mut on_retry) {
                Step::Retry(delay) => std::thread::sleep(delay),
                Step::Stop(err) => return Err(err),
            },
        }
    }
}
