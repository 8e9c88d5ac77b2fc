//! Memoized cell values for a single projection run
//!
//! Every cell value is a pure function of (cell name, period, extra arguments)
//! within a run, so once computed it is stored and never recomputed for the
//! lifetime of the run.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Projection period (years from the valuation date)
///
/// Signed so that a formula stepping below its base case asks for `t = -1`
/// and is rejected, instead of wrapping.
pub type Period = i32;

/// Identity of one cell evaluation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub name: String,
    pub t: Period,
    pub args: Vec<i64>,
}

impl CellKey {
    pub fn new(name: &str, t: Period, args: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            t,
            args: args.to_vec(),
        }
    }
}

/// Cache statistics for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cell values owned by one projection run
#[derive(Debug, Clone, Default)]
pub struct CellCache {
    values: HashMap<CellKey, f64>,
    hits: u64,
    misses: u64,
}

impl CellCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value, recording a hit or a miss
    pub fn get(&mut self, key: &CellKey) -> Option<f64> {
        match self.values.get(key) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a value without touching the statistics
    pub fn peek(&self, key: &CellKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn insert(&mut self, key: CellKey, value: f64) {
        self.values.insert(key, value);
    }

    /// Cached values of an argument-free cell, ordered by period
    pub fn series(&self, name: &str) -> BTreeMap<Period, f64> {
        self.values
            .iter()
            .filter(|(key, _)| key.name == name && key.args.is_empty())
            .map(|(key, &value)| (key.t, value))
            .collect()
    }

    /// Clear all cached values and statistics
    pub fn clear(&mut self) {
        self.values.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.values.len(),
        }
    }
}
