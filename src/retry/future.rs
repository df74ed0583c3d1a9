//! Async retry executors built on tokio.
//!
//! Same loop as the blocking executors, but delays are `tokio::time::sleep`,
//! so dropping the future (or losing a `select!`) cancels a retry mid-delay.

use std::future::Future;
use std::time::Duration;

use super::error::{AttemptError, RetryError, TimeoutError};
use super::executor::{Attempts, RetryEvent, Step};
use super::policy::RetryPolicy;

/// Retry an async operation using a factory function.
///
/// Each attempt calls `operation` again to get a fresh future.
///
/// # Example
///
/// ```rust
/// use breakwater::{retry_async, AttemptError, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::exponential(Duration::from_millis(1)).with_attempts(3);
///
/// let result = retry_async(&policy, || async { Ok::<_, AttemptError<String>>(42) }).await;
///
/// assert_eq!(result, Ok(42));
/// # });
/// ```
pub async fn retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
{
    retry_async_with_hooks(policy, operation, |_| true, |_| {}).await
}

/// Retry an async operation only when the predicate returns true for the error.
pub async fn retry_async_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
    P: Fn(&E) -> bool,
{
    retry_async_with_hooks(policy, operation, should_retry, |_| {}).await
}

/// Retry an async operation with a predicate and an observability hook.
///
/// The hook is synchronous and runs before each delay.
pub async fn retry_async_with_hooks<T, E, F, Fut, P, H>(
    policy: &RetryPolicy,
    mut operation: F,
    should_retry: P,
    mut on_retry: H,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
    P: Fn(&E) -> bool,
    H: FnMut(&RetryEvent<'_, E>),
{
    let mut attempts = Attempts::new(policy);
    loop {
        match operation().await {
            Ok(value) => {
                attempts.succeeded();
                return Ok(value);
            }
            Err(error) => match attempts.fail(error, &should_retry, &mut on_retry) {
                Step::Retry(delay) => tokio::time::sleep(delay).await,
                Step::Stop(err) => return Err(err),
            },
        }
    }
}

/// Retry an async operation, giving up entirely once `deadline` has passed.
///
/// The deadline covers every attempt and every delay. An attempt or delay in
/// flight when it expires is dropped.
///
/// # Example
///
/// ```rust
/// use breakwater::{retry_with_timeout, AttemptError, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::fixed_delay(Duration::from_secs(1)).with_attempts(10);
///
/// let result = retry_with_timeout(Duration::from_millis(20), &policy, || async {
///     Err::<(), _>(AttemptError::from("unavailable"))
/// })
/// .await;
///
/// assert!(result.unwrap_err().is_timeout());
/// # });
/// ```
pub async fn retry_with_timeout<T, E, F, Fut>(
    deadline: Duration,
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, TimeoutError<RetryError<E>>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
{
    match tokio::time::timeout(deadline, retry_async(policy, operation)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TimeoutError::failed(err)),
        Err(_elapsed) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                "retry deadline exceeded"
            );
            Err(TimeoutError::elapsed(deadline))
        }
    }
}
