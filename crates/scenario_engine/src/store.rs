//! Persistence of calculation results.
//!
//! One record per (scenario, period). Every upsert replaces the record and
//! bumps its revision, so callers can tell a recomputation from the
//! original.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenario_core::types::{Period, ScenarioId};

use crate::result::CalculationResult;

/// Store error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A writer panicked while holding the lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A persisted calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCalculation {
    /// Starts at 1, incremented on every upsert of the same slot
    pub revision: u64,
    /// When this revision was stored
    pub calculated_at: DateTime<Utc>,
    /// The result itself
    pub result: CalculationResult,
}

/// Storage for calculation results.
pub trait CalculationStore: Send + Sync {
    /// Loads the latest record for a slot.
    fn load(
        &self,
        scenario_id: &ScenarioId,
        period: &Period,
    ) -> Result<Option<StoredCalculation>, StoreError>;

    /// Inserts or replaces the record for the result's slot, returning the new revision.
    fn upsert(&self, result: CalculationResult) -> Result<u64, StoreError>;

    /// All records of a scenario, ordered by period.
    fn list(&self, scenario_id: &ScenarioId) -> Result<Vec<StoredCalculation>, StoreError>;
}

/// `RwLock`-guarded in-process store.
#[derive(Debug, Default)]
pub struct InMemoryCalculationStore {
    records: RwLock<BTreeMap<(ScenarioId, Period), StoredCalculation>>,
}

impl InMemoryCalculationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CalculationStore for InMemoryCalculationStore {
    fn load(
        &self,
        scenario_id: &ScenarioId,
        period: &Period,
    ) -> Result<Option<StoredCalculation>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&(scenario_id.clone(), *period)).cloned())
    }

    fn upsert(&self, result: CalculationResult) -> Result<u64, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let key = (result.scenario_id.clone(), result.period);
        let revision = records.get(&key).map_or(1, |r| r.revision + 1);
        records.insert(
            key,
            StoredCalculation {
                revision,
                calculated_at: Utc::now(),
                result,
            },
        );
        Ok(revision)
    }

    fn list(&self, scenario_id: &ScenarioId) -> Result<Vec<StoredCalculation>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .filter(|((sid, _), _)| sid == scenario_id)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
