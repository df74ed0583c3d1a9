//! Property-based tests for retry policies and executors

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use breakwater::{retry, retry_if, AttemptError, Backoff, RetryPolicy, StopReason};

fn instant(attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed_delay(Duration::ZERO).with_attempts(attempts)
}

proptest! {
    #[test]
    fn prop_always_failing_invoked_exactly_k_times(k in 1u32..20) {
        let mut calls = 0u32;

        let result = retry(&instant(k), || {
            calls += 1;
            Err::<(), _>(AttemptError::from("down"))
        });

        prop_assert_eq!(calls, k);
        let err = result.unwrap_err();
        prop_assert_eq!(err.attempts(), k);
        prop_assert_eq!(err.failures().count() as u32, k);
        prop_assert_eq!(err.to_string().matches(": down").count() as u32, k);
    }

    #[test]
    fn prop_succeeds_on_attempt_j((k, j) in (1u32..20).prop_flat_map(|k| (Just(k), 1..=k))) {
        let mut calls = 0u32;

        let result = retry(&instant(k), || {
            calls += 1;
            if calls < j {
                Err(AttemptError::from("not yet"))
            } else {
                Ok(calls)
            }
        });

        prop_assert_eq!(result, Ok(j));
        prop_assert_eq!(calls, j);
    }

    #[test]
    fn prop_rejecting_predicate_invokes_once(k in 1u32..20) {
        let mut calls = 0u32;

        let err = retry_if(
            &instant(k),
            || {
                calls += 1;
                Err::<(), _>(AttemptError::from("fatal"))
            },
            |_| false,
        )
        .unwrap_err();

        prop_assert_eq!(calls, 1);
        let expected = if k == 1 { StopReason::Exhausted } else { StopReason::NotRetryable };
        prop_assert_eq!(err.reason(), expected);
    }

    #[test]
    fn prop_last_error_only_keeps_final_error(k in 1u32..20) {
        let mut calls = 0u32;

        let err = retry(&instant(k).with_last_error_only(true), || {
            calls += 1;
            Err::<(), _>(AttemptError::from(calls))
        })
        .unwrap_err();

        prop_assert_eq!(*err.last_error(), k);
        prop_assert_eq!(err.into_errors(), vec![k]);
    }

    #[test]
    fn prop_fixed_delay_is_constant(millis in 0u64..10_000, n in 0u32..64) {
        let policy = RetryPolicy::fixed_delay(Duration::from_millis(millis));
        prop_assert_eq!(policy.delay_for_attempt(n), policy.delay_for_attempt(n + 1));
        prop_assert_eq!(policy.delay_for_attempt(n), Duration::from_millis(millis));
    }

    #[test]
    fn prop_exponential_doubles(millis in 1u64..1_000, n in 0u32..16) {
        let policy = RetryPolicy::exponential(Duration::from_millis(millis));
        prop_assert_eq!(policy.delay_for_attempt(n + 1), policy.delay_for_attempt(n) * 2);
    }

    #[test]
    fn prop_exponential_doubles_past_u32_range(nanos in 1u64..1_000, n in 0u32..64) {
        let policy = RetryPolicy::exponential(Duration::from_nanos(nanos));
        prop_assert_eq!(policy.nominal_delay(n + 1), policy.nominal_delay(n) * 2);
        prop_assert_eq!(
            policy.nominal_delay(n).as_nanos(),
            u128::from(nanos) << n
        );
    }

    #[test]
    fn prop_exponential_never_decreases(nanos in 1u64..1_000_000_000, n in 0u32..200) {
        let policy = RetryPolicy::exponential(Duration::from_nanos(nanos));
        let current = policy.nominal_delay(n);
        let next = policy.nominal_delay(n + 1);

        prop_assert!(next >= current);
        if next < Duration::MAX {
            prop_assert_eq!(next, current * 2);
        }
    }

    #[test]
    fn prop_jittered_delay_within_bounds(millis in 1u64..10_000, n in 0u32..10, seed in any::<u64>()) {
        let policy = RetryPolicy::exponential_jitter(Duration::from_millis(millis));
        let nominal = (Duration::from_millis(millis) * 2u32.pow(n)).as_nanos();

        let mut rng = StdRng::seed_from_u64(seed);
        let seeded = policy.delay_with_rng(n, &mut rng).as_nanos();
        let shared = policy.delay_for_attempt(n).as_nanos();

        for d in [seeded, shared] {
            prop_assert!(d * 4 >= nominal * 3);
            prop_assert!(d * 4 < nominal * 5);
        }
    }

    #[test]
    fn prop_builder_order_last_wins(first in 1u32..10, second in 1u32..10) {
        let policy = RetryPolicy::default()
            .with_attempts(first)
            .with_backoff(Backoff::Fixed)
            .with_attempts(second)
            .exponential_backoff();

        prop_assert_eq!(policy.attempts(), second);
        prop_assert_eq!(policy.backoff(), Backoff::Exponential);
    }
}
