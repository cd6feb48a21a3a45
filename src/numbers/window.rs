//! Deduplicated, fixed-capacity windows keyed by category
//!
//! A [`Window`] keeps the most recent unique values in insertion order.
//! Membership and the running sum are maintained alongside the deque so
//! insert, eviction, and the average are all O(1) per value.
//!
//! [`WindowStore`] owns every window. Each key has its own mutex, so merges
//! on the same key are serialized while different keys proceed
//! independently. Windows are created on the first merge for a key and
//! live for the whole process.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Result of one merge, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// Window contents before the merge
    #[serde(rename = "windowPrevState")]
    pub previous_state: Vec<i64>,
    /// Window contents after the merge
    #[serde(rename = "windowCurrState")]
    pub current_state: Vec<i64>,
    /// Values exactly as supplied, duplicates included
    #[serde(rename = "numbers")]
    pub supplied: Vec<i64>,
    /// Mean of `current_state` rounded to 2 places; 0 when empty
    #[serde(rename = "avg")]
    pub average: f64,
}

#[derive(Debug, Clone)]
pub struct Window {
    values: VecDeque<i64>,
    members: HashSet<i64>,
    sum: i128,
    capacity: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            sum: 0,
            capacity,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.members.contains(&value)
    }

    /// Append a value not already present, evicting the oldest when full
    fn push_unique(&mut self, value: i64) {
        if self.values.len() >= self.capacity {
            if let Some(oldest) = self.values.pop_front() {
                self.members.remove(&oldest);
                self.sum -= oldest as i128;
            }
        }
        self.values.push_back(value);
        self.members.insert(value);
        self.sum += value as i128;
    }

    /// Merge a fetched batch into the window
    ///
    /// Values already in the window before the merge are skipped, and so
    /// are repeats within the batch (first occurrence wins). Survivors are
    /// appended in input order.
    pub fn merge(&mut self, new_values: &[i64]) -> MergeOutcome {
        let previous_state = self.snapshot();

        let mut accepted = HashSet::new();
        let fresh: Vec<i64> = new_values
            .iter()
            .copied()
            .filter(|v| !self.contains(*v) && accepted.insert(*v))
            .collect();

        for value in fresh {
            self.push_unique(value);
        }

        MergeOutcome {
            previous_state,
            current_state: self.snapshot(),
            supplied: new_values.to_vec(),
            average: self.average(),
        }
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.values.iter().copied().collect()
    }

    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        mean_half_up(self.sum, self.values.len() as i128)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `sum / len` rounded to 2 decimals, halves rounding up
///
/// Rounds in integer hundredths so exact halves are never lost to float
/// representation. `len` must be positive.
pub fn mean_half_up(sum: i128, len: i128) -> f64 {
    (sum * 200 + len).div_euclid(2 * len) as f64 / 100.0
}

pub struct WindowStore<K> {
    capacity: usize,
    windows: RwLock<HashMap<K, Arc<Mutex<Window>>>>,
}

impl<K> WindowStore<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn window_for(&self, key: &K) -> Arc<Mutex<Window>> {
        {
            let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(window) = windows.get(key) {
                return window.clone();
            }
        }

        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        windows
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Window::new(self.capacity))))
            .clone()
    }

    /// Atomically merge `new_values` into the window for `key`
    pub fn merge(&self, key: &K, new_values: &[i64]) -> MergeOutcome {
        let window = self.window_for(key);
        let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);
        window.merge(new_values)
    }

    /// Copy of the current contents; empty for a key never merged
    pub fn snapshot(&self, key: &K) -> Vec<i64> {
        let window = {
            let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
            windows.get(key).cloned()
        };

        match window {
            Some(window) => window.lock().unwrap_or_else(PoisonError::into_inner).snapshot(),
            None => Vec::new(),
        }
    }
}
