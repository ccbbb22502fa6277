//! Per-run capacity ledger.
//!
//! RULE: all capacity arithmetic during a run happens here, against a copy
//! of each worker's starting workload. Worker records are never mutated, so
//! a failed run leaves nothing half-applied.

use crate::{
    types::{Hours, WorkerId},
    worker::Roster,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityLedger {
    opening: BTreeMap<WorkerId, Hours>,
    load: BTreeMap<WorkerId, Hours>,
}

impl CapacityLedger {
    /// Snapshot every roster worker's current workload.
    pub fn open(roster: &Roster) -> Self {
        let opening: BTreeMap<_, _> = roster
            .iter()
            .map(|w| (w.id.clone(), w.current_workload_hours))
            .collect();
        Self {
            load: opening.clone(),
            opening,
        }
    }

    /// Current load for a worker; unknown workers carry none.
    pub fn load(&self, worker_id: &str) -> Hours {
        self.load.get(worker_id).copied().unwrap_or(0.0)
    }

    pub fn opening_load(&self, worker_id: &str) -> Hours {
        self.opening.get(worker_id).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, worker_id: &str, hours: Hours) {
        *self.load.entry(worker_id.to_string()).or_insert(0.0) += hours;
    }

    /// Hours consumed during this run, per worker, for workers that took any.
    pub fn deltas(&self) -> BTreeMap<WorkerId, Hours> {
        self.load
            .iter()
            .filter_map(|(id, load)| {
                let delta = load - self.opening.get(id).copied().unwrap_or(0.0);
                (delta > 0.0).then(|| (id.clone(), delta))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WorkerId, &Hours)> {
        self.load.iter()
    }
}
