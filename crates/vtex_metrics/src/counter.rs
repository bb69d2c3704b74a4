//! Named counters for tracking texture events

use std::collections::BTreeMap;

/// Monotonic event counters keyed by static names.
///
/// Keys are `&'static str` so the hot path never allocates.
#[derive(Debug, Default)]
pub struct Counter {
    counters: BTreeMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, name: &'static str, value: u64) {
        *self.counters.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// All counters, ordered by name.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }
}
