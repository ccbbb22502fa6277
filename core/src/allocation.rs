//! Allocation output records.
//!
//! Everything here is created by the engine for one run and handed to the
//! caller whole: successful allocations and unallocated tasks together, so
//! no work silently disappears.

use crate::{
    task::Task,
    types::{TaskId, WorkerId},
    worker::Worker,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The tasks assigned to one worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub worker_email: String,
    pub tasks: Vec<Task>,
    /// Sum of task estimates. Wider than a single estimate so totals never overflow.
    pub total_estimated_hours: u64,
    /// Human-readable justification. Never read by allocation logic.
    pub reasoning: String,
}

impl Allocation {
    pub fn for_worker(worker: &Worker) -> Self {
        Self {
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            worker_email: worker.email.clone(),
            tasks: Vec::new(),
            total_estimated_hours: 0,
            reasoning: String::new(),
        }
    }

    pub fn push(&mut self, task: Task) {
        self.total_estimated_hours += u64::from(task.estimated_hours);
        self.tasks.push(task);
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.iter().map(|t| &t.id)
    }
}

/// Which phase gave up on a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPhase {
    Matching,
    Consolidation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnallocatedReason {
    /// No worker had enough free capacity to be considered at all.
    NoEligibleWorker,
    /// Candidates existed but the best score did not clear the threshold.
    BelowScoreThreshold,
    /// The task fits no candidate under the hard capacity constraint.
    CapacityExceeded,
}

impl UnallocatedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoEligibleWorker => "no_eligible_worker",
            Self::BelowScoreThreshold => "below_score_threshold",
            Self::CapacityExceeded => "capacity_exceeded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnallocatedTask {
    pub task: Task,
    pub phase: AllocationPhase,
    pub reason: UnallocatedReason,
    /// Best candidate score seen by the matcher, if any candidate was eligible.
    pub best_score: Option<f64>,
}

/// One matcher decision, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub worker_id: WorkerId,
    pub allocation_score: f64,
    pub skill_match: f64,
    pub availability: f64,
    pub estimated_completion: DateTime<Utc>,
}

/// Aggregate figures for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSummary {
    pub total_tasks: usize,
    pub allocated_tasks: usize,
    pub unallocated_tasks: usize,
    pub allocation_rate: f64,
    pub total_allocated_hours: u64,
    pub workers_after_matching: usize,
    pub workers_after_consolidation: usize,
    pub average_allocation_score: f64,
    pub average_cost_efficiency: f64,
}
