//! Outbound call budget
//!
//! A fixed pool of permits, filled at start and topped up by a background
//! ticker one permit per `refill_interval`. Deposits into a full pool are
//! dropped, so the pool never holds more than `capacity` permits.
//!
//! ## Lifecycle
//!
//! [`RateLimiter::start`] spawns the ticker on the current tokio runtime.
//! [`RateLimiter::shutdown`] stops it and closes the pool; callers blocked
//! in [`RateLimiter::acquire`] are released with [`LimiterClosed`].
//! Dropping the limiter also stops the ticker.

use crate::config::ConfigError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Returned by `acquire` once the limiter has been shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterClosed;

impl std::fmt::Display for LimiterClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rate limiter has been shut down")
    }
}

impl std::error::Error for LimiterClosed {}

pub struct RateLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
    refill_interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a fully loaded limiter and spawn its refill ticker
    ///
    /// Fails fast when `capacity` is zero or `refill_interval` is zero.
    /// Must be called from within a tokio runtime.
    pub fn start(capacity: usize, refill_interval: Duration) -> Result<Arc<Self>, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "rate limiter capacity must be at least 1".to_string(),
            ));
        }
        if refill_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "rate limiter refill interval must be non-zero".to_string(),
            ));
        }

        let permits = Arc::new(Semaphore::new(capacity));
        let ticker = tokio::spawn(refill_task(permits.clone(), capacity, refill_interval));

        log::info!(
            "⏰ Rate limiter started ({} permits, refill every {}ms)",
            capacity,
            refill_interval.as_millis()
        );

        Ok(Arc::new(Self {
            permits,
            capacity,
            refill_interval,
            ticker: Mutex::new(Some(ticker)),
        }))
    }

    /// Block until a permit is available, then consume it
    pub async fn acquire(&self) -> Result<(), LimiterClosed> {
        let permit = self.permits.acquire().await.map_err(|_| LimiterClosed)?;
        // Consumed permits only come back through the ticker
        permit.forget();
        Ok(())
    }

    /// Permits currently available without blocking
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Stop the ticker and release all waiters with an error
    pub fn shutdown(&self) {
        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
            self.permits.close();
            log::info!("⏹️  Rate limiter stopped");
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

async fn refill_task(permits: Arc<Semaphore>, capacity: usize, refill_interval: Duration) {
    let mut timer = interval_at(Instant::now() + refill_interval, refill_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;

        // Only this task adds permits, so the pool cannot grow between
        // the check and the deposit.
        if permits.available_permits() < capacity {
            permits.add_permits(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_starts_fully_loaded() {
        let limiter = RateLimiter::start(3, Duration::from_millis(100)).unwrap();
        assert_eq!(limiter.available(), 3);

        for _ in 0..3 {
            limiter.acquire().await.unwrap();
        }
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_beyond_capacity_waits_for_refill() {
        let limiter = RateLimiter::start(2, Duration::from_millis(100)).unwrap();

        let start = Instant::now();
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));

        limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_never_exceeds_capacity() {
        let limiter = RateLimiter::start(3, Duration::from_millis(10)).unwrap();
        limiter.acquire().await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(limiter.available(), 3);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(limiter.available(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_waiters() {
        let limiter = RateLimiter::start(1, Duration::from_secs(60)).unwrap();
        limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;

        limiter.shutdown();
        assert_eq!(waiter.await.unwrap(), Err(LimiterClosed));
    }

    #[tokio::test]
    async fn test_zero_configuration_fails_fast() {
        assert!(RateLimiter::start(0, Duration::from_millis(10)).is_err());
        assert!(RateLimiter::start(5, Duration::ZERO).is_err());
    }
}
