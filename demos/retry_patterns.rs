//! Retry Patterns Example
//!
//! Demonstrates the blocking retry executor. Shows practical patterns including:
//! - Basic retry with fixed delay
//! - Comparing backoff strategies
//! - Conditional retry (retry_if)
//! - Unrecoverable errors
//! - Retry with observability hooks
//! - Keeping only the last error
//!
//! Run with `--features tracing` to also see the executor's own log events.

use std::fmt;
use std::time::{Duration, Instant};

use breakwater::{
    retry, retry_if, retry_with_hooks, unrecoverable, AttemptError, RetryEvent, RetryPolicy,
};

#[derive(Debug, Clone, PartialEq)]
enum ApiError {
    Unavailable,
    RateLimited,
    Unauthorized,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unavailable => write!(f, "503 service unavailable"),
            ApiError::RateLimited => write!(f, "429 too many requests"),
            ApiError::Unauthorized => write!(f, "401 unauthorized"),
        }
    }
}

impl std::error::Error for ApiError {}

// ==================== Basic Retry ====================

/// Example 1: Basic retry with a fixed delay
///
/// The operation fails four times, then succeeds on the fifth attempt.
fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let policy = RetryPolicy::fixed_delay(Duration::from_millis(10)).with_attempts(5);
    let start = Instant::now();
    let mut calls = 0;

    let result = retry(&policy, || {
        calls += 1;
        println!("  Attempt {}", calls);
        if calls < 5 {
            Err(AttemptError::from(ApiError::Unavailable))
        } else {
            Ok("payload")
        }
    });

    println!("Result: {:?} after {:?}", result, start.elapsed());
}

// ==================== Different Backoff Strategies ====================

/// Example 2: Comparing different backoff strategies
fn example_backoff_strategies() {
    println!("\n=== Example 2: Backoff Strategies ===");

    let base = Duration::from_millis(100);
    let policies = [
        ("Fixed", RetryPolicy::fixed_delay(base)),
        ("Exponential", RetryPolicy::exponential(base)),
        ("Exponential + jitter", RetryPolicy::exponential_jitter(base)),
    ];

    for (name, policy) in &policies {
        let delays: Vec<_> = (0..5).map(|n| policy.delay_for_attempt(n)).collect();
        println!("{} delays: {:?}", name, delays);
    }
}

// ==================== Conditional Retry ====================

/// Example 3: Only retry errors that might go away
fn example_retry_if() {
    println!("\n=== Example 3: Conditional Retry ===");

    let policy = RetryPolicy::fixed_delay(Duration::from_millis(5)).with_attempts(5);
    let mut calls = 0;

    let result = retry_if(
        &policy,
        || {
            calls += 1;
            Err::<(), _>(AttemptError::from(ApiError::Unauthorized))
        },
        |err| matches!(err, ApiError::Unavailable | ApiError::RateLimited),
    );

    if let Err(err) = result {
        println!("Stopped after {} call(s): {} ({})", calls, err.last_error(), err.reason());
    }
}

// ==================== Unrecoverable Errors ====================

/// Example 4: The operation itself decides to stop
fn example_unrecoverable() {
    println!("\n=== Example 4: Unrecoverable Errors ===");

    let policy = RetryPolicy::fixed_delay(Duration::from_millis(5)).with_attempts(5);
    let mut calls = 0;

    let result = retry(&policy, || {
        calls += 1;
        match calls {
            1 => Err(AttemptError::from(ApiError::RateLimited)),
            _ => Err::<(), _>(unrecoverable(ApiError::Unauthorized)),
        }
    });

    if let Err(err) = result {
        println!("{}", err);
    }
}

// ==================== Hooks ====================

/// Example 5: Observe each retry for logging or metrics
fn example_hooks() {
    println!("\n=== Example 5: Retry Hooks ===");

    let policy = RetryPolicy::exponential(Duration::from_millis(5)).with_attempts(4);

    let result = retry_with_hooks(
        &policy,
        || Err::<(), _>(AttemptError::from(ApiError::Unavailable)),
        |_| true,
        |event: &RetryEvent<'_, ApiError>| {
            println!(
                "  attempt {} failed: {}, retrying in {:?} (elapsed {:?})",
                event.attempt, event.error, event.next_delay, event.elapsed
            );
        },
    );

    if let Err(err) = result {
        println!("{}", err);
    }
}

// ==================== Last Error Only ====================

/// Example 6: Report only the final failure
fn example_last_error_only() {
    println!("\n=== Example 6: Last Error Only ===");

    let policy = RetryPolicy::fixed_delay(Duration::from_millis(5))
        .with_attempts(3)
        .with_last_error_only(true);
    let mut calls = 0;

    let result = retry(&policy, || {
        calls += 1;
        if calls < 3 {
            Err::<(), _>(AttemptError::from(ApiError::Unavailable))
        } else {
            Err(AttemptError::from(ApiError::RateLimited))
        }
    });

    if let Err(err) = result {
        println!("Final error: {}", err);
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    println!("Retry Patterns Examples");
    println!("=======================");

    example_basic_retry();
    example_backoff_strategies();
    example_retry_if();
    example_unrecoverable();
    example_hooks();
    example_last_error_only();

    println!("\n=== All examples completed successfully! ===");
}
