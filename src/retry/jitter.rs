//! Randomized delay perturbation.
//!
//! Jitter spreads out retries from many callers that failed at the same moment,
//! so they don't hammer a recovering dependency in lockstep. All callers share
//! one generator, seeded from the OS once per process.

use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

static SHARED_RNG: LazyLock<Mutex<StdRng>> = LazyLock::new(|| Mutex::new(StdRng::from_os_rng()));

/// Randomize `delay` uniformly within `[0.75 * delay, 1.25 * delay)`.
///
/// Draws from the process-wide generator, which is safe to use from many
/// threads at once.
///
/// # Examples
///
/// ```rust
/// use breakwater::retry::jitter;
/// use std::time::Duration;
///
/// let d = jitter(Duration::from_millis(100));
/// assert!(d >= Duration::from_millis(75) && d < Duration::from_millis(125));
/// ```
pub fn jitter(delay: Duration) -> Duration {
    let mut rng = SHARED_RNG.lock().unwrap_or_else(PoisonError::into_inner);
    jitter_with(delay, &mut *rng)
}

/// Randomize `delay` within `[0.75 * delay, 1.25 * delay)` using `rng`.
pub fn jitter_with<R: Rng + ?Sized>(delay: Duration, rng: &mut R) -> Duration {
    let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
    let spread = nanos / 4;
    if spread == 0 {
        return delay;
    }
    let low = nanos - spread;
    let high = nanos.saturating_add(spread);
    Duration::from_nanos(rng.random_range(low..high))
}
