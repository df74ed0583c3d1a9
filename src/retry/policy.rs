//! Retry policy types and configuration.

use std::num::NonZeroU32;
use std::time::Duration;

use rand::Rng;

use super::jitter;

/// A retry policy describing how often to invoke an operation and how long to
/// wait between attempts.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// Pass one to [`retry`](crate::retry::retry) (or one of its variants) to run an
/// operation under it.
///
/// # Defaults
///
/// - 3 attempts
/// - 100ms base delay
/// - [`Backoff::ExponentialJitter`]
/// - every failed attempt recorded in the returned error
///
/// # Zero Attempts
///
/// An operation is always invoked at least once. `with_attempts(0)` is treated
/// as `with_attempts(1)`.
///
/// # Examples
///
/// ```rust
/// use breakwater::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed_delay(Duration::from_millis(10))
///     .with_attempts(5);
///
/// assert_eq!(policy.attempts(), 5);
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryPolicy {
    attempts: NonZeroU32,
    #[cfg_attr(feature = "serde", serde(rename = "base_delay_ms", with = "millis"))]
    base_delay: Duration,
    backoff: Backoff,
    record_all_attempts: bool,
}

/// The backoff strategy for delays between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Backoff {
    /// Every delay equals the base delay.
    Fixed,
    /// Delay doubles: base * 2^attempt.
    Exponential,
    /// Exponential delay randomized by ±25%.
    #[default]
    ExponentialJitter,
}

const DEFAULT_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(3) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff: Backoff::default(),
            record_all_attempts: true,
        }
    }
}

impl RetryPolicy {
    /// Create the default policy. Equivalent to [`RetryPolicy::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy with a constant delay between attempts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::fixed_delay(Duration::from_millis(500));
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
    /// ```
    pub fn fixed_delay(delay: Duration) -> Self {
        Self::default().with_base_delay(delay).fixed()
    }

    /// Create a policy with exponentially increasing delay.
    ///
    /// Delay = base * 2^attempt
    ///
    /// # Examples
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100));
    ///
    /// // Delay doubles: 100ms, 200ms, 400ms, ...
    /// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self::default().with_base_delay(base).with_backoff(Backoff::Exponential)
    }

    /// Create a policy with exponential delay randomized by ±25%.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential_jitter(Duration::from_millis(100));
    ///
    /// // Somewhere in [150ms, 250ms)
    /// let delay = policy.delay_for_attempt(1);
    /// assert!(delay >= Duration::from_millis(150));
    /// assert!(delay < Duration::from_millis(250));
    /// ```
    pub fn exponential_jitter(base: Duration) -> Self {
        Self::default()
            .with_base_delay(base)
            .with_backoff(Backoff::ExponentialJitter)
    }

    /// Set the total number of invocations, including the first one.
    ///
    /// Zero is treated as one.
    pub fn with_attempts(mut self, n: u32) -> Self {
        self.attempts = NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);
        self
    }

    /// Set the delay that seeds every backoff strategy.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Use [`Backoff::Fixed`].
    pub fn fixed(self) -> Self {
        self.with_backoff(Backoff::Fixed)
    }

    /// Use [`Backoff::Exponential`].
    pub fn exponential_backoff(self) -> Self {
        self.with_backoff(Backoff::Exponential)
    }

    /// Use [`Backoff::ExponentialJitter`].
    pub fn exponential_jitter_backoff(self) -> Self {
        self.with_backoff(Backoff::ExponentialJitter)
    }

    /// Keep only the most recent failure instead of one entry per attempt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default().with_last_error_only(true);
    /// assert!(!policy.records_all_attempts());
    /// ```
    pub fn with_last_error_only(mut self, last_only: bool) -> Self {
        self.record_all_attempts = !last_only;
        self
    }

    /// Get the total number of attempts.
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    /// Get the base delay.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Get the backoff strategy.
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether every failed attempt is kept in the returned error.
    pub fn records_all_attempts(&self) -> bool {
        self.record_all_attempts
    }

    /// Delay before the attempt following attempt `n` (0-indexed), before jitter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential_jitter(Duration::from_millis(10));
    /// assert_eq!(policy.nominal_delay(3), Duration::from_millis(80));
    /// ```
    pub fn nominal_delay(&self, n: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential | Backoff::ExponentialJitter => doubled(self.base_delay, n),
        }
    }

    /// Delay after attempt `n` (0-indexed) fails.
    ///
    /// Jittered strategies draw from the process-wide random source.
    pub fn delay_for_attempt(&self, n: u32) -> Duration {
        let nominal = self.nominal_delay(n);
        match self.backoff {
            Backoff::ExponentialJitter => jitter::jitter(nominal),
            Backoff::Fixed | Backoff::Exponential => nominal,
        }
    }

    /// Like [`delay_for_attempt`](Self::delay_for_attempt) but with an explicit
    /// random source, for reproducible sequences.
    pub fn delay_with_rng<R: Rng + ?Sized>(&self, n: u32, rng: &mut R) -> Duration {
        let nominal = self.nominal_delay(n);
        match self.backoff {
            Backoff::ExponentialJitter => jitter::jitter_with(nominal, rng),
            Backoff::Fixed | Backoff::Exponential => nominal,
        }
    }
}

/// `base * 2^n`, saturating at `Duration::MAX`.
fn doubled(base: Duration, n: u32) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let nanos = base.as_nanos();
    if nanos == 0 {
        return Duration::ZERO;
    }
    if n >= nanos.leading_zeros() {
        return Duration::MAX;
    }
    let scaled = nanos << n;
    match u64::try_from(scaled / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (scaled % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_millis(100));
        assert_eq!(policy.backoff(), Backoff::ExponentialJitter);
        assert!(policy.records_all_attempts());
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::fixed_delay(Duration::from_millis(100));

        for n in 0..10 {
            assert_eq!(policy.delay_for_attempt(n), Duration::from_millis(100));
            assert_eq!(policy.delay_for_attempt(n), policy.delay_for_attempt(n + 1));
        }
    }

    #[test]
    fn test_exponential_delay() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100));

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_exponential_saturates() {
        let policy = RetryPolicy::exponential(Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(200), Duration::MAX);
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_exponential_keeps_doubling_past_32_attempts() {
        let policy = RetryPolicy::exponential(Duration::from_nanos(1));

        assert_eq!(policy.nominal_delay(32), Duration::from_nanos(1 << 32));
        assert_eq!(policy.nominal_delay(33), policy.nominal_delay(32) * 2);
        assert_eq!(policy.nominal_delay(40), Duration::from_nanos(1 << 40));
        assert_eq!(policy.nominal_delay(63), Duration::from_nanos(1 << 63));
    }

    #[test]
    fn test_exponential_saturation_boundary() {
        // 2^93 ns is still under u64::MAX seconds, 2^94 ns is not.
        let policy = RetryPolicy::exponential(Duration::from_nanos(1));

        assert!(policy.nominal_delay(93) < Duration::MAX);
        assert_eq!(policy.nominal_delay(93), policy.nominal_delay(92) * 2);
        assert_eq!(policy.nominal_delay(94), Duration::MAX);
        assert_eq!(policy.nominal_delay(127), Duration::MAX);
    }

    #[test]
    fn test_exponential_zero_base_stays_zero() {
        let policy = RetryPolicy::exponential(Duration::ZERO);
        assert_eq!(policy.nominal_delay(500), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_is_one() {
        let policy = RetryPolicy::default().with_attempts(0);
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_later_options_override_earlier() {
        let policy = RetryPolicy::default()
            .with_attempts(2)
            .fixed()
            .with_attempts(7)
            .exponential_backoff()
            .with_last_error_only(true)
            .with_last_error_only(false);

        assert_eq!(policy.attempts(), 7);
        assert_eq!(policy.backoff(), Backoff::Exponential);
        assert!(policy.records_all_attempts());
    }

    #[test]
    fn test_jitter_with_seeded_rng_is_reproducible() {
        let policy = RetryPolicy::exponential_jitter(Duration::from_millis(100));

        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let first: Vec<_> = (0..5).map(|n| policy.delay_with_rng(n, &mut a)).collect();
        let second: Vec<_> = (0..5).map(|n| policy.delay_with_rng(n, &mut b)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unjittered_strategies_ignore_rng() {
        let mut rng = StdRng::seed_from_u64(1);
        let policy = RetryPolicy::exponential(Duration::from_millis(10));
        assert_eq!(policy.delay_with_rng(2, &mut rng), Duration::from_millis(40));
    }

    #[test]
    fn test_policy_is_clone() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100)).with_attempts(3);
        let cloned = policy.clone();
        assert_eq!(policy, cloned);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_with_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"attempts": 5, "backoff": "fixed"}"#).unwrap();

        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.backoff(), Backoff::Fixed);
        assert_eq!(policy.base_delay(), Duration::from_millis(100));
        assert!(policy.records_all_attempts());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_base_delay_in_millis() {
        let policy = RetryPolicy::exponential(Duration::from_millis(250));
        let json = serde_json::to_value(&policy).unwrap();

        assert_eq!(json["base_delay_ms"], 250);
        assert_eq!(json["backoff"], "exponential");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_zero_attempts() {
        let result: Result<RetryPolicy, _> = serde_json::from_str(r#"{"attempts": 0}"#);
        assert!(result.is_err());
    }
}
