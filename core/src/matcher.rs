//! Initial skill/availability matcher.
//!
//! Greedy first pass: tasks in (priority, complexity) order, each to the
//! eligible worker with the best allocation score.
//!
//! RULES:
//!   - A worker is eligible only with at least `min_free_capacity_fraction`
//!     of the task's hours free in the ledger.
//!   - Score ties go to the lowest worker id (roster order).
//!   - A task whose best score does not clear `min_allocation_score` is
//!     returned as unallocated, never raised.

use crate::{
    allocation::{Allocation, AllocationPhase, TaskAssignment, UnallocatedReason, UnallocatedTask},
    analysis::estimate_completion,
    config::AllocConfig,
    event::AllocEvent,
    ledger::CapacityLedger,
    scorer::Scorer,
    task::Task,
    types::WorkerId,
    worker::{Roster, Worker},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Keyed (and therefore ordered) by worker id.
    pub allocations: BTreeMap<WorkerId, Allocation>,
    pub assignments: Vec<TaskAssignment>,
    pub unallocated: Vec<UnallocatedTask>,
    pub ledger: CapacityLedger,
    pub events: Vec<AllocEvent>,
}

impl MatchOutcome {
    pub fn workers_used(&self) -> usize {
        self.allocations.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.assignments.len()
    }

    /// Every matched task, worker by worker, in assignment order.
    pub fn flattened_tasks(&self) -> Vec<Task> {
        self.allocations
            .values()
            .flat_map(|a| a.tasks.iter().cloned())
            .collect()
    }
}

pub struct InitialMatcher<'a> {
    config: &'a AllocConfig,
    scorer: Scorer<'a>,
    started_at: DateTime<Utc>,
}

impl<'a> InitialMatcher<'a> {
    pub fn new(config: &'a AllocConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            config,
            scorer: Scorer::new(config),
            started_at,
        }
    }

    pub fn run(&self, tasks: &[Task], roster: &Roster) -> MatchOutcome {
        let mut ledger = CapacityLedger::open(roster);
        let mut allocations: BTreeMap<WorkerId, Allocation> = BTreeMap::new();
        let mut assignments = Vec::new();
        let mut unallocated = Vec::new();
        let mut events = Vec::new();

        for task in sorted_for_matching(tasks) {
            log::debug!("Matching task {} ({})", task.id, task.title);

            let best = self.best_candidate(task, roster, &ledger);
            match best {
                Some((worker, score)) if score > self.config.scoring.min_allocation_score => {
                    let load = ledger.load(&worker.id);
                    assignments.push(TaskAssignment {
                        task_id: task.id.clone(),
                        worker_id: worker.id.clone(),
                        allocation_score: score,
                        skill_match: self.scorer.skill_match(worker, task),
                        availability: self.scorer.availability_ratio(worker, load),
                        estimated_completion: estimate_completion(
                            task.estimated_hours,
                            worker,
                            &self.config.timeline,
                            self.started_at,
                        ),
                    });
                    ledger.add(&worker.id, task.hours());
                    allocations
                        .entry(worker.id.clone())
                        .or_insert_with(|| Allocation::for_worker(worker))
                        .push(task.clone());

                    log::debug!("Matched {} to {} (score {score:.2})", task.id, worker.name);
                    events.push(AllocEvent::TaskMatched {
                        task_id: task.id.clone(),
                        worker_id: worker.id.clone(),
                        score,
                    });
                }
                other => {
                    let best_score = other.map(|(_, s)| s);
                    let reason = if best_score.is_some() {
                        UnallocatedReason::BelowScoreThreshold
                    } else {
                        UnallocatedReason::NoEligibleWorker
                    };
                    log::warn!("Could not allocate task {} ({}): {}", task.id, task.title, reason.as_str());
                    events.push(AllocEvent::TaskUnmatched {
                        task_id: task.id.clone(),
                        reason,
                        best_score,
                    });
                    unallocated.push(UnallocatedTask {
                        task: task.clone(),
                        phase: AllocationPhase::Matching,
                        reason,
                        best_score,
                    });
                }
            }
        }

        for allocation in allocations.values_mut() {
            allocation.reasoning = matcher_reasoning(allocation, &assignments);
        }

        events.push(AllocEvent::MatchingCompleted {
            allocated: assignments.len(),
            unallocated: unallocated.len(),
            workers_used: allocations.len(),
        });
        log::info!(
            "Matching: {}/{} tasks allocated across {} worker(s)",
            assignments.len(),
            tasks.len(),
            allocations.len()
        );

        MatchOutcome {
            allocations,
            assignments,
            unallocated,
            ledger,
            events,
        }
    }

    /// Highest-scoring eligible worker. `None` when nobody has room.
    fn best_candidate<'r>(
        &self,
        task: &Task,
        roster: &'r Roster,
        ledger: &CapacityLedger,
    ) -> Option<(&'r Worker, f64)> {
        let required_free = self.config.scoring.min_free_capacity_fraction * task.hours();
        let mut best: Option<(&Worker, f64)> = None;

        for worker in roster {
            let load = ledger.load(&worker.id);
            if worker.capacity_hours_per_week - load < required_free {
                continue;
            }
            let score = self.scorer.allocation_score(worker, task, load);
            // Strict comparison: on a tie the earlier (lower id) worker stays.
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((worker, score));
            }
        }
        best
    }
}

/// Priority first, then complexity, both descending. Stable, so equal keys
/// keep input order.
pub fn sorted_for_matching(tasks: &[Task]) -> Vec<&Task> {
    let mut order: Vec<&Task> = tasks.iter().collect();
    order.sort_by(|a, b| (b.priority, b.complexity).cmp(&(a.priority, a.complexity)));
    order
}

fn matcher_reasoning(allocation: &Allocation, assignments: &[TaskAssignment]) -> String {
    let scores: Vec<f64> = assignments
        .iter()
        .filter(|a| a.worker_id == allocation.worker_id)
        .map(|a| a.allocation_score)
        .collect();
    let average = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    format!(
        "Matched {} task(s) totaling {}h to {} on skills and availability (average match score {average:.2})",
        allocation.tasks.len(),
        allocation.total_estimated_hours,
        allocation.worker_name,
    )
}
