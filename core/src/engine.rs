//! The allocation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Boundary validation (roster + task set)
//!   2. Initial matcher
//!   3. Consolidation optimizer, over the matcher's task set
//!   4. Utilization reporter, over the optimizer's ledger
//!
//! RULES:
//!   - A run is sequential; each step consumes the whole output of the last.
//!   - Worker records are never mutated. All load lives in per-run ledgers.
//!   - The engine keeps no state between runs and never touches storage.
//!     Committing workload deltas is the caller's job (see `RosterStore`).
//!   - Only roster-level failures abort a run. Per-task failures come back
//!     in `unallocated`.

use crate::{
    allocation::{Allocation, AllocationSummary, TaskAssignment, UnallocatedTask},
    analysis::TaskAnalysis,
    config::AllocConfig,
    error::AllocResult,
    event::AllocEvent,
    matcher::InitialMatcher,
    optimizer::ConsolidationOptimizer,
    quick_assign::{quick_assign, QuickAssignment},
    task::{validate_tasks, Task},
    types::{Hours, RunId, WorkerId},
    utilization::{UtilizationReporter, WorkerUtilization},
    worker::{Roster, Worker},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Hours a run adds to one worker, with the record version it was computed
/// against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadDelta {
    pub worker_id: WorkerId,
    pub hours: Hours,
    pub expected_version: u64,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRun {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    /// Final, consolidated allocations ordered by worker id.
    pub allocations: Vec<Allocation>,
    /// Matcher rejects followed by optimizer drops.
    pub unallocated: Vec<UnallocatedTask>,
    pub utilization: Vec<WorkerUtilization>,
    pub summary: AllocationSummary,
    pub analysis: TaskAnalysis,
    /// The matcher's first-pass allocations, kept for comparison.
    pub matched: Vec<Allocation>,
    pub assignments: Vec<TaskAssignment>,
    pub workload_deltas: Vec<WorkloadDelta>,
    pub events: Vec<AllocEvent>,
}

impl AllocationRun {
    pub fn workers_used(&self) -> usize {
        self.allocations.len()
    }

    pub fn allocation_for(&self, worker_id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.worker_id == worker_id)
    }
}

pub struct AllocationEngine {
    pub run_id: RunId,
    config: AllocConfig,
    started_at: DateTime<Utc>,
}

impl AllocationEngine {
    pub fn new(run_id: RunId, config: AllocConfig) -> AllocResult<Self> {
        config.validate()?;
        Ok(Self {
            run_id,
            config,
            started_at: Utc::now(),
        })
    }

    /// Pin the run start used for completion estimates. Runs with the same
    /// inputs and start time produce identical output.
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn config(&self) -> &AllocConfig {
        &self.config
    }

    /// A fresh, unique run id.
    pub fn new_run_id() -> RunId {
        format!("run-{}", uuid::Uuid::new_v4())
    }

    pub fn run(&self, tasks: &[Task], workers: &[Worker]) -> AllocResult<AllocationRun> {
        // 1. Boundary validation
        let roster = Roster::new(workers.to_vec())?;
        validate_tasks(tasks)?;

        log::info!(
            "Run {}: allocating {} task(s) across {} active worker(s)",
            self.run_id,
            tasks.len(),
            roster.len()
        );
        let mut events = vec![AllocEvent::RunStarted {
            run_id: self.run_id.clone(),
            task_count: tasks.len(),
            worker_count: roster.len(),
        }];

        // 2. Initial matcher
        let matched = InitialMatcher::new(&self.config, self.started_at).run(tasks, &roster);
        events.extend(matched.events.iter().cloned());

        // 3. Consolidation optimizer
        let matched_ids: BTreeSet<WorkerId> = matched.allocations.keys().cloned().collect();
        let consolidated = ConsolidationOptimizer::new(&self.config).run(
            &matched.flattened_tasks(),
            &roster,
            &matched_ids,
        );
        events.extend(consolidated.events.iter().cloned());

        if consolidated.workers_used() > matched.workers_used() {
            log::warn!(
                "Consolidation grew headcount from {} to {} worker(s)",
                matched.workers_used(),
                consolidated.workers_used()
            );
        } else {
            log::info!(
                "Consolidation: {} -> {} worker(s)",
                matched.workers_used(),
                consolidated.workers_used()
            );
        }

        // 4. Utilization reporter
        let utilization =
            UtilizationReporter::new(&self.config.utilization).report(&roster, &consolidated.ledger);

        let workload_deltas = consolidated
            .ledger
            .deltas()
            .into_iter()
            .filter_map(|(worker_id, hours)| {
                roster.get(&worker_id).map(|w| WorkloadDelta {
                    expected_version: w.version,
                    worker_id,
                    hours,
                })
            })
            .collect();

        let mut unallocated = matched.unallocated.clone();
        unallocated.extend(consolidated.dropped.iter().cloned());

        let summary = summarize(
            tasks.len(),
            &consolidated.allocations,
            &unallocated,
            &matched.assignments,
            matched.workers_used(),
            |id| consolidated.cost_scores.get(id).copied(),
        );

        events.push(AllocEvent::RunCompleted {
            run_id: self.run_id.clone(),
            allocated: summary.allocated_tasks,
            unallocated: summary.unallocated_tasks,
            workers_used: summary.workers_after_consolidation,
        });
        log::info!(
            "Run {} completed: {}/{} task(s) allocated, {} unallocated",
            self.run_id,
            summary.allocated_tasks,
            summary.total_tasks,
            summary.unallocated_tasks
        );

        Ok(AllocationRun {
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            allocations: consolidated.allocations,
            unallocated,
            utilization,
            summary,
            analysis: TaskAnalysis::of(tasks, &self.config.timeline),
            matched: matched.allocations.into_values().collect(),
            assignments: matched.assignments,
            workload_deltas,
            events,
        })
    }

    /// Assign one simple task without the two-phase pipeline.
    pub fn quick_assign(&self, task: &Task, workers: &[Worker]) -> AllocResult<QuickAssignment> {
        let roster = Roster::new(workers.to_vec())?;
        task.validate()?;
        Ok(quick_assign(task, &roster, &self.config, self.started_at))
    }
}

fn summarize(
    total_tasks: usize,
    allocations: &[Allocation],
    unallocated: &[UnallocatedTask],
    assignments: &[TaskAssignment],
    workers_after_matching: usize,
    cost_of: impl Fn(&str) -> Option<f64>,
) -> AllocationSummary {
    let allocated_tasks: usize = allocations.iter().map(|a| a.tasks.len()).sum();
    let mean = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    let scores: Vec<f64> = assignments.iter().map(|a| a.allocation_score).collect();
    let costs: Vec<f64> = allocations
        .iter()
        .filter_map(|a| cost_of(a.worker_id.as_str()))
        .collect();

    AllocationSummary {
        total_tasks,
        allocated_tasks,
        unallocated_tasks: unallocated.len(),
        allocation_rate: if total_tasks == 0 {
            0.0
        } else {
            allocated_tasks as f64 / total_tasks as f64
        },
        total_allocated_hours: allocations.iter().map(|a| a.total_estimated_hours).sum(),
        workers_after_matching,
        workers_after_consolidation: allocations.len(),
        average_allocation_score: mean(&scores),
        average_cost_efficiency: mean(&costs),
    }
}
