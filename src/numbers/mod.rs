//! Running averages over number categories
//!
//! `AverageService::average` fetches one batch for a category, merges it
//! into that category's window, and then checks the elapsed time against
//! the configured budget. The check runs after the merge: a late batch is
//! still merged, only its response is discarded.

pub mod window;

pub use window::{MergeOutcome, Window, WindowStore};

use crate::error::ServiceError;
use crate::remote::RemoteSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Number category addressed by a one-letter id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Primes,
    Fibonacci,
    Even,
    Random,
}

impl Category {
    /// Parse the one-letter id used on the HTTP surface
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "p" => Some(Category::Primes),
            "f" => Some(Category::Fibonacci),
            "e" => Some(Category::Even),
            "r" => Some(Category::Random),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Category::Primes => "p",
            Category::Fibonacci => "f",
            Category::Even => "e",
            Category::Random => "r",
        }
    }

    /// Sub-path on the remote source
    pub fn resource_path(&self) -> &'static str {
        match self {
            Category::Primes => "primes",
            Category::Fibonacci => "fibo",
            Category::Even => "even",
            Category::Random => "rand",
        }
    }

    pub fn all() -> [Category; 4] {
        [
            Category::Primes,
            Category::Fibonacci,
            Category::Even,
            Category::Random,
        ]
    }
}

pub struct AverageService {
    source: Arc<dyn RemoteSource + Send + Sync>,
    store: WindowStore<Category>,
    deadline: Duration,
}

impl AverageService {
    pub fn new(
        source: Arc<dyn RemoteSource + Send + Sync>,
        window_size: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            source,
            store: WindowStore::new(window_size),
            deadline,
        }
    }

    pub fn store(&self) -> &WindowStore<Category> {
        &self.store
    }

    /// Fetch, merge, and report the window for `category`
    pub async fn average(&self, category: Category) -> Result<MergeOutcome, ServiceError> {
        let started = Instant::now();

        let numbers = self.source.fetch_numbers(category).await.map_err(|e| {
            log::error!("❌ Failed to fetch numbers for '{}': {}", category.id(), e);
            ServiceError::Remote(e)
        })?;

        let outcome = self.store.merge(&category, &numbers);

        let elapsed = started.elapsed();
        if elapsed > self.deadline {
            log::warn!(
                "⚠️  Averaging '{}' took {}ms (budget {}ms), discarding response",
                category.id(),
                elapsed.as_millis(),
                self.deadline.as_millis()
            );
            return Err(ServiceError::DeadlineExceeded {
                elapsed,
                budget: self.deadline,
            });
        }

        log::debug!(
            "Window '{}': {} values, avg {:.2}",
            category.id(),
            outcome.current_state.len(),
            outcome.average
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ids_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
        assert_eq!(Category::from_id("x"), None);
        assert_eq!(Category::from_id(""), None);
        assert_eq!(Category::Fibonacci.resource_path(), "fibo");
        assert_eq!(Category::Random.resource_path(), "rand");
    }
}
