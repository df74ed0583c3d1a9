//! Error types for retry operations.

use std::fmt;
use std::time::Duration;

/// The failure of a single attempt, as reported by the retried operation.
///
/// Plain errors convert into [`AttemptError::Transient`], so `?` inside an
/// operation does the right thing. Wrap an error with
/// [`AttemptError::unrecoverable`] to stop retrying immediately, whatever the
/// retry predicate says.
///
/// # Examples
///
/// ```rust
/// use breakwater::{retry, AttemptError, RetryPolicy, StopReason};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed_delay(Duration::from_millis(1)).with_attempts(5);
/// let mut calls = 0;
///
/// let result: Result<(), _> = retry(&policy, || {
///     calls += 1;
///     Err(AttemptError::unrecoverable("bad credentials"))
/// });
///
/// let err = result.unwrap_err();
/// assert_eq!(calls, 1);
/// assert_eq!(err.reason(), StopReason::Unrecoverable);
/// assert_eq!(*err.last_error(), "bad credentials");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError<E> {
    /// A failure worth trying again, subject to the retry predicate.
    Transient(E),
    /// A failure that ends the retry loop immediately.
    Unrecoverable(E),
}

impl<E> AttemptError<E> {
    /// Mark an error as retryable.
    pub fn transient(error: E) -> Self {
        Self::Transient(error)
    }

    /// Mark an error as not worth retrying.
    pub fn unrecoverable(error: E) -> Self {
        Self::Unrecoverable(error)
    }

    /// Returns true if this error stops the retry loop.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }

    /// Strip the classification, returning the underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Transient(e) | Self::Unrecoverable(e) => e,
        }
    }
}

impl<E> From<E> for AttemptError<E> {
    fn from(error: E) -> Self {
        Self::Transient(error)
    }
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(e) => write!(f, "{}", e),
            Self::Unrecoverable(e) => write!(f, "unrecoverable: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for AttemptError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transient(e) | Self::Unrecoverable(e) => Some(e),
        }
    }
}

/// Wrap an error so the retry loop stops on it.
///
/// Shorthand for [`AttemptError::unrecoverable`].
pub fn unrecoverable<E>(error: E) -> AttemptError<E> {
    AttemptError::Unrecoverable(error)
}

/// Why the retry loop gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every permitted attempt failed.
    Exhausted,
    /// The retry predicate rejected an error.
    NotRetryable,
    /// The operation returned an [`AttemptError::Unrecoverable`].
    Unrecoverable,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("attempts exhausted"),
            Self::NotRetryable => f.write_str("error not retryable"),
            Self::Unrecoverable => f.write_str("unrecoverable error"),
        }
    }
}

/// Error returned when a retried operation never succeeded.
///
/// Depending on the policy it holds either every failure, keyed by 1-based
/// attempt number, or only the last one. In the first case the `Display`
/// output lists each failure as `#n: <error>`; in the second it is the last
/// error's own message.
///
/// # Examples
///
/// ```rust
/// use breakwater::{retry, AttemptError, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed_delay(Duration::from_millis(1)).with_attempts(2);
///
/// let err = retry(&policy, || Err::<(), _>(AttemptError::from("refused"))).unwrap_err();
///
/// assert!(err.is_exhausted());
/// assert_eq!(err.attempts(), 2);
/// assert_eq!(
///     err.to_string(),
///     "retry failed after 2 attempts:\n#1: refused\n#2: refused"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    earlier: Vec<E>,
    last: E,
    record_all: bool,
    attempts: u32,
    reason: StopReason,
    elapsed: Duration,
}

impl<E> RetryError<E> {
    /// Every failure was kept: `earlier` holds attempts `1..n`, `last` is attempt `n`.
    pub(crate) fn all(earlier: Vec<E>, last: E, reason: StopReason, elapsed: Duration) -> Self {
        let attempts = u32::try_from(earlier.len()).map_or(u32::MAX, |n| n.saturating_add(1));
        Self {
            earlier,
            last,
            record_all: true,
            attempts,
            reason,
            elapsed,
        }
    }

    pub(crate) fn last(last: E, attempts: u32, reason: StopReason, elapsed: Duration) -> Self {
        Self {
            earlier: Vec::new(),
            last,
            record_all: false,
            attempts,
            reason,
            elapsed,
        }
    }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Why the loop stopped.
    pub fn reason(&self) -> StopReason {
        self.reason
    }

    /// Returns true if every permitted attempt was used.
    pub fn is_exhausted(&self) -> bool {
        self.reason == StopReason::Exhausted
    }

    /// Wall-clock time from the first attempt to giving up, including delays.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns true if one error per attempt was kept.
    pub fn records_all_attempts(&self) -> bool {
        self.record_all
    }

    /// Recorded failures as `(attempt, error)` pairs, 1-based and in order.
    ///
    /// Holds a single entry when the policy keeps only the last error.
    pub fn failures(&self) -> impl Iterator<Item = (u32, &E)> {
        (1u32..)
            .zip(self.earlier.iter())
            .chain(std::iter::once((self.attempts, &self.last)))
    }

    /// The error from the final attempt.
    pub fn last_error(&self) -> &E {
        &self.last
    }

    /// Extract the error from the final attempt, discarding the rest.
    pub fn into_last_error(self) -> E {
        self.last
    }

    /// Extract every recorded error in attempt order.
    pub fn into_errors(self) -> Vec<E> {
        let mut errors = self.earlier;
        errors.push(self.last);
        errors
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.record_all {
            return write!(f, "{}", self.last);
        }
        let plural = if self.attempts == 1 { "" } else { "s" };
        write!(f, "retry failed after {} attempt{}:", self.attempts, plural)?;
        for (n, e) in self.failures() {
            write!(f, "\n#{}: {}", n, e)?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.last_error())
    }
}

/// Error from `retry_with_timeout`.
///
/// Either the overall deadline passed while attempts or backoff sleeps were
/// still pending, or the retries ended on their own with `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The deadline passed before the retries finished.
    Elapsed {
        /// Deadline the whole retry sequence was given.
        deadline: Duration,
    },
    /// The retries finished in time but did not succeed.
    Failed(E),
}

impl<E> TimeoutError<E> {
    pub(crate) fn elapsed(deadline: Duration) -> Self {
        Self::Elapsed { deadline }
    }

    pub(crate) fn failed(error: E) -> Self {
        Self::Failed(error)
    }

    /// Returns true if the deadline cut the retries short.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Elapsed { .. })
    }

    /// The deadline that passed, if that is why the call ended.
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            Self::Elapsed { deadline } => Some(*deadline),
            Self::Failed(_) => None,
        }
    }

    /// The retry error, if the retries ended before the deadline.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Elapsed { .. } => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed { deadline } => {
                write!(f, "retry deadline of {:?} elapsed before success", deadline)
            }
            Self::Failed(e) => e.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Elapsed { .. } => None,
            Self::Failed(e) => Some(e),
        }
    }
}
