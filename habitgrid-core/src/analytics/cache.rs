//! Keyed cache of computed percentile sets.
//!
//! Entries are keyed by goal and date window. Any write to a goal's records
//! must call [`PercentileCache::invalidate_goal`] before the next read.

use super::percentiles::{DateWindow, PercentileSet};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    goal_id: String,
    window: DateWindow,
}

#[derive(Debug, Default)]
pub struct PercentileCache {
    entries: HashMap<CacheKey, PercentileSet>,
    hits: u64,
    misses: u64,
}

impl PercentileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, goal_id: &str, window: DateWindow) -> Option<PercentileSet> {
        self.entries
            .get(&CacheKey {
                goal_id: goal_id.to_string(),
                window,
            })
            .copied()
    }

    /// Return the cached set, computing and storing it on a miss.
    pub fn get_or_compute<F>(&mut self, goal_id: &str, window: DateWindow, compute: F) -> PercentileSet
    where
        F: FnOnce() -> PercentileSet,
    {
        let key = CacheKey {
            goal_id: goal_id.to_string(),
            window,
        };
        if let Some(set) = self.entries.get(&key) {
            self.hits += 1;
            return *set;
        }

        self.misses += 1;
        let set = compute();
        self.entries.insert(key, set);
        set
    }

    /// Drop every entry for `goal_id`, whatever its window.
    pub fn invalidate_goal(&mut self, goal_id: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.goal_id != goal_id);
        tracing::trace!(
            goal_id,
            dropped = before - self.entries.len(),
            "Invalidated percentile cache"
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
