//! Async admission gate built on tokio.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use super::error::AcquireError;

/// Async counterpart of [`AdmissionGate`](crate::AdmissionGate).
///
/// Clones share the same permits. Waiters are admitted in FIFO order.
/// [`acquire`](Self::acquire) is cancel-safe: racing it against a timeout or
/// shutdown signal in `tokio::select!` never leaks a permit, whichever branch
/// wins.
///
/// # Examples
///
/// ```rust
/// use breakwater::AsyncAdmissionGate;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let gate = AsyncAdmissionGate::new(5);
///
/// for _ in 0..5 {
///     tokio::select! {
///         permit = gate.acquire() => {
///             let permit = permit.unwrap();
///             tokio::spawn(async move {
///                 tokio::time::sleep(Duration::from_millis(10)).await;
///                 drop(permit);
///             });
///         }
///         _ = tokio::time::sleep(Duration::from_secs(1)) => return,
///     }
/// }
///
/// gate.wait().await.unwrap();
/// assert_eq!(gate.available(), 5);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct AsyncAdmissionGate {
    capacity: u32,
    semaphore: Arc<Semaphore>,
}

impl AsyncAdmissionGate {
    /// Create a gate admitting up to `capacity` concurrent holders.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity as usize)),
        }
    }

    /// Maximum number of concurrent permits.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of permits that could be acquired right now.
    pub fn available(&self) -> u32 {
        u32::try_from(self.semaphore.available_permits()).unwrap_or(self.capacity)
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Wait for a permit, then take it.
    ///
    /// The permit is `'static` and can be moved into a spawned task.
    pub async fn acquire(&self) -> Result<AsyncPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AcquireError::Closed)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(available = self.semaphore.available_permits(), "permit acquired");

        Ok(AsyncPermit { _permit: permit })
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Result<AsyncPermit, AcquireError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(AsyncPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) => Err(AcquireError::NoPermits),
            Err(TryAcquireError::Closed) => Err(AcquireError::Closed),
        }
    }

    /// Wait up to `timeout` for a permit.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<AsyncPermit, AcquireError> {
        tokio::time::timeout(timeout, self.acquire())
            .await
            .map_err(|_| AcquireError::Timeout { duration: timeout })?
    }

    /// Wait until every outstanding permit has been released.
    ///
    /// Takes the whole capacity, which queues later acquirers behind the
    /// drain, and then hands it straight back.
    pub async fn wait(&self) -> Result<(), AcquireError> {
        #[cfg(feature = "tracing")]
        tracing::trace!(available = self.semaphore.available_permits(), "draining admission gate");

        let all = self
            .semaphore
            .acquire_many(self.capacity)
            .await
            .map_err(|_| AcquireError::Closed)?;
        drop(all);
        Ok(())
    }

    /// Refuse all further acquisitions and wake everyone waiting.
    ///
    /// Permits already handed out stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

/// A slot in an [`AsyncAdmissionGate`], returned to the gate when dropped.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct AsyncPermit {
    _permit: OwnedSemaphorePermit,
}

impl AsyncPermit {
    /// Return the permit to the gate.
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_acquire_up_to_capacity() {
        let gate = AsyncAdmissionGate::new(2);

        let a = gate.acquire().await.unwrap();
        let _b = gate.acquire().await.unwrap();

        assert_eq!(gate.available(), 0);
        assert_eq!(gate.try_acquire().unwrap_err(), AcquireError::NoPermits);

        a.release();
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_full_gate_blocks_until_release() {
        let gate = AsyncAdmissionGate::new(1);
        let held = gate.acquire().await.unwrap();

        let err = gate
            .acquire_timeout(Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(gate.available(), 0);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            held.release();
        });

        let permit = gate.acquire_timeout(Duration::from_secs(5)).await;
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn test_select_timeout_branch_leaves_gate_consistent() {
        let gate = AsyncAdmissionGate::new(1);
        let held = gate.acquire().await.unwrap();

        tokio::select! {
            _ = gate.acquire() => panic!("gate should be full"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }

        held.release();
        assert_eq!(gate.available(), 1);
        assert!(gate.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_wait_returns_after_all_workers_finish() {
        let gate = AsyncAdmissionGate::new(5);
        let finished = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        for _ in 0..5 {
            let permit = gate.acquire().await.unwrap();
            let finished = finished.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        gate.wait().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(finished.load(Ordering::SeqCst), 5);
        assert_eq!(gate.available(), 5);
    }

    #[tokio::test]
    async fn test_reusable_after_wait() {
        let gate = AsyncAdmissionGate::new(3);

        for _ in 0..2 {
            for _ in 0..3 {
                let permit = gate.acquire().await.unwrap();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    drop(permit);
                });
            }
            gate.wait().await.unwrap();
            assert_eq!(gate.available(), 3);
        }
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let gate = AsyncAdmissionGate::new(1);
        let held = gate.acquire().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(drop) })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.close();

        assert_eq!(waiter.await.unwrap(), Err(AcquireError::Closed));
        assert!(gate.is_closed());
        assert_eq!(gate.wait().await, Err(AcquireError::Closed));
        held.release();
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let gate = AsyncAdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.available(), 1);
    }
}
