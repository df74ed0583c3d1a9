//! Admission Gate Example
//!
//! Demonstrates bounding concurrent work:
//! - Blocking gate with worker threads and a drain barrier
//! - Reusing a gate for a second wave
//! - Async gate raced against a timeout in `tokio::select!`
//! - Combining the gate with async retries

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use breakwater::{retry_async, AdmissionGate, AsyncAdmissionGate, AttemptError, RetryPolicy};

/// Example 1: Worker threads, at most three at a time
fn example_blocking_waves() {
    println!("\n=== Example 1: Blocking Gate ===");

    let gate = Arc::new(AdmissionGate::new(3));

    for wave in 1..=2 {
        let start = Instant::now();
        for worker in 0..6 {
            let permit = match gate.acquire_owned() {
                Ok(permit) => permit,
                Err(err) => {
                    println!("  could not admit worker {}: {}", worker, err);
                    continue;
                }
            };
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                println!("  wave {} worker {} done", wave, worker);
                permit.release();
            });
        }

        if let Err(err) = gate.wait() {
            println!("  drain failed: {}", err);
        }
        println!("Wave {} drained in {:?}", wave, start.elapsed());
    }
}

/// Example 2: Give up on admission after a timeout
async fn example_select_timeout() {
    println!("\n=== Example 2: Acquire With Timeout ===");

    let gate = AsyncAdmissionGate::new(1);
    let _held = gate.acquire().await;

    tokio::select! {
        _ = gate.acquire() => println!("unexpectedly admitted"),
        _ = tokio::time::sleep(Duration::from_millis(50)) => {
            println!("Timed out waiting; {} permit(s) available", gate.available());
        }
    }
}

/// Example 3: Retrying tasks under a concurrency cap
async fn example_gate_with_retries() {
    println!("\n=== Example 3: Gate + Retry ===");

    let gate = AsyncAdmissionGate::new(2);
    let policy = RetryPolicy::exponential_jitter(Duration::from_millis(5)).with_attempts(3);

    for id in 0..4u32 {
        let permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(err) => {
                println!("  could not admit task {}: {}", id, err);
                continue;
            }
        };
        let policy = policy.clone();
        tokio::spawn(async move {
            let result = retry_async(&policy, || async move {
                if id % 2 == 0 {
                    Ok(id)
                } else {
                    Err(AttemptError::from("upstream unavailable"))
                }
            })
            .await;
            match result {
                Ok(value) => println!("  task {} -> {}", id, value),
                Err(err) => println!("  task {} failed: {}", id, err.to_string().replace('\n', " ")),
            }
            permit.release();
        });
    }

    if let Err(err) = gate.wait().await {
        println!("drain failed: {}", err);
    }
    println!("All tasks finished");
}

#[tokio::main]
async fn main() {
    println!("Admission Gate Examples");
    println!("=======================");

    example_blocking_waves();
    example_select_timeout().await;
    example_gate_with_retries().await;

    println!("\n=== All examples completed successfully! ===");
}
