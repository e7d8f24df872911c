//! Thread-safe result cache keyed by (scenario, period).
//!
//! # Caching Strategy
//!
//! - One entry per slot; a new result for the slot replaces the old one
//! - A lookup hits only when the stored fingerprint matches the caller's
//! - Double-check on insert: if another thread stored a result with the same
//!   fingerprint while this one was computing, the existing `Arc` wins
//!
//! Results are computed outside the lock so concurrent batch runs for
//! different slots never wait on each other's evaluation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use scenario_core::types::{Period, ScenarioId};

use crate::result::CalculationResult;

type Slot = (ScenarioId, Period);

/// Shared cache of calculation results.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<Slot, Arc<CalculationResult>>>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for the slot if its fingerprint matches.
    pub fn get(
        &self,
        scenario_id: &ScenarioId,
        period: &Period,
        fingerprint: &str,
    ) -> Option<Arc<CalculationResult>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(scenario_id.clone(), *period))
            .filter(|hit| hit.fingerprint == fingerprint)
            .map(Arc::clone)
    }

    /// Returns the cached result for the slot, computing and storing it on miss.
    pub fn get_or_compute<F>(
        &self,
        scenario_id: &ScenarioId,
        period: &Period,
        fingerprint: &str,
        compute: F,
    ) -> Arc<CalculationResult>
    where
        F: FnOnce() -> CalculationResult,
    {
        // Fast path: read lock check
        if let Some(hit) = self.get(scenario_id, period, fingerprint) {
            return hit;
        }

        let fresh = Arc::new(compute());

        // Slow path: write lock with double-check
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let key = (scenario_id.clone(), *period);
        if let Some(existing) = entries.get(&key) {
            if existing.fingerprint == fingerprint {
                return Arc::clone(existing);
            }
        }
        entries.insert(key, Arc::clone(&fresh));
        fresh
    }

    /// Stores a result, replacing whatever the slot held.
    pub fn insert(&self, result: CalculationResult) -> Arc<CalculationResult> {
        let key = (result.scenario_id.clone(), result.period);
        let result = Arc::new(result);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&result));
        result
    }

    /// Drops every entry of a scenario. Returns how many were removed.
    pub fn invalidate_scenario(&self, scenario_id: &ScenarioId) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(sid, _), _| sid != scenario_id);
        before - entries.len()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
