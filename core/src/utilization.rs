//! Post-assignment utilization summary. Read-only.

use crate::{
    config::UtilizationThresholds,
    ledger::CapacityLedger,
    types::{Hours, WorkerId},
    worker::Roster,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationStatus {
    Available,
    FullyUtilized,
    Overloaded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerUtilization {
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub total_capacity: Hours,
    /// Final ledger load: starting workload plus this run's hours.
    pub allocated_hours: Hours,
    pub utilization_rate: f64,
    pub status: UtilizationStatus,
}

pub struct UtilizationReporter<'a> {
    thresholds: &'a UtilizationThresholds,
}

impl<'a> UtilizationReporter<'a> {
    pub fn new(thresholds: &'a UtilizationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, rate: f64) -> UtilizationStatus {
        if rate > self.thresholds.overloaded {
            UtilizationStatus::Overloaded
        } else if rate > self.thresholds.fully_utilized {
            UtilizationStatus::FullyUtilized
        } else {
            UtilizationStatus::Available
        }
    }

    /// One row per roster worker, in roster order.
    pub fn report(&self, roster: &Roster, ledger: &CapacityLedger) -> Vec<WorkerUtilization> {
        roster
            .iter()
            .map(|worker| {
                let capacity = worker.capacity_hours_per_week;
                let load = ledger.load(&worker.id);
                let rate = if capacity > 0.0 { load / capacity } else { 0.0 };
                WorkerUtilization {
                    worker_id: worker.id.clone(),
                    worker_name: worker.name.clone(),
                    total_capacity: capacity,
                    allocated_hours: load,
                    utilization_rate: rate,
                    status: self.classify(rate),
                }
            })
            .collect()
    }
}
