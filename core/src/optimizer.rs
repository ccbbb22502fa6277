//! Consolidation optimizer.
//!
//! Re-derives the assignment from scratch to use as few workers as
//! possible. The matcher's specific assignments are discarded; its task set
//! and (by default) its set of workers are reused.
//!
//! RULES:
//!   - Tasks in descending priority, then descending hours, so big chunks of
//!     work are placed first.
//!   - Hard capacity: a worker's consolidated hours never exceed the hours
//!     free at run start. No slack.
//!   - Cheapest adjusted cost wins; a worker already holding work this pass
//!     has its cost multiplied by `reuse_multiplier`. Ties go to lowest id.
//!   - A task that fits no candidate in the pool overflows onto the rest of
//!     the roster. Only then can headcount grow past the matcher's.
//!   - A task that fits nowhere is returned as dropped, never lost.

use crate::{
    allocation::{Allocation, AllocationPhase, UnallocatedReason, UnallocatedTask},
    config::{AllocConfig, CandidatePool},
    event::AllocEvent,
    ledger::CapacityLedger,
    scorer::Scorer,
    task::Task,
    types::{Hours, WorkerId},
    worker::{Roster, Worker},
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct ConsolidationOutcome {
    /// Ordered by worker id.
    pub allocations: Vec<Allocation>,
    pub dropped: Vec<UnallocatedTask>,
    /// Run-start workload plus consolidated hours.
    pub ledger: CapacityLedger,
    /// Unadjusted cost efficiency of every active worker, for this run only.
    pub cost_scores: BTreeMap<WorkerId, f64>,
    pub events: Vec<AllocEvent>,
}

impl ConsolidationOutcome {
    pub fn workers_used(&self) -> usize {
        self.allocations.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.allocations.iter().map(|a| a.tasks.len()).sum()
    }
}

struct Assignment<'r> {
    worker: &'r Worker,
    allocation: Allocation,
}

impl Assignment<'_> {
    fn hours(&self) -> Hours {
        self.allocation.total_estimated_hours as f64
    }
}

pub struct ConsolidationOptimizer<'a> {
    config: &'a AllocConfig,
    scorer: Scorer<'a>,
}

impl<'a> ConsolidationOptimizer<'a> {
    pub fn new(config: &'a AllocConfig) -> Self {
        Self {
            config,
            scorer: Scorer::new(config),
        }
    }

    /// Consolidate `tasks` across the candidate pool.
    ///
    /// `matched` is the set of workers the matcher used; with the default
    /// pool they are tried first and the rest of the roster only takes tasks
    /// none of them can hold. An empty `matched` set means the whole roster
    /// is the pool, so a raw task list can be consolidated directly.
    pub fn run(
        &self,
        tasks: &[Task],
        roster: &Roster,
        matched: &BTreeSet<WorkerId>,
    ) -> ConsolidationOutcome {
        let candidates: Vec<&Worker> = match self.config.consolidation.candidate_pool {
            CandidatePool::MatchedWorkers if !matched.is_empty() => roster.restricted_to(matched),
            _ => roster.iter().collect(),
        };
        // Everyone outside the preferred pool, tried only when a task fits no candidate.
        let overflow_pool: Vec<&Worker> = roster
            .iter()
            .filter(|w| !candidates.iter().any(|c| c.id == w.id))
            .collect();

        let cost_scores: BTreeMap<WorkerId, f64> = roster
            .iter()
            .map(|w| (w.id.clone(), self.scorer.cost_efficiency(w)))
            .collect();

        let mut ledger = CapacityLedger::open(roster);
        let mut assignments: BTreeMap<WorkerId, Assignment> = BTreeMap::new();
        let mut dropped = Vec::new();
        let mut events = Vec::new();

        for task in sorted_for_consolidation(tasks) {
            let mut overflow = false;
            let mut best = self.cheapest(task, &candidates, &assignments, &cost_scores);
            if best.is_none() {
                best = self.cheapest(task, &overflow_pool, &assignments, &cost_scores);
                overflow = best.is_some();
            }

            let Some((worker, cost)) = best else {
                log::warn!(
                    "Task {} ({}h) fits no candidate under hard capacity; returning it unallocated",
                    task.id,
                    task.estimated_hours
                );
                events.push(AllocEvent::TaskDropped {
                    task_id: task.id.clone(),
                    hours: task.estimated_hours,
                });
                dropped.push(UnallocatedTask {
                    task: task.clone(),
                    phase: AllocationPhase::Consolidation,
                    reason: UnallocatedReason::CapacityExceeded,
                    best_score: None,
                });
                continue;
            };

            let reused = assignments.contains_key(&worker.id);
            assignments
                .entry(worker.id.clone())
                .or_insert_with(|| Assignment {
                    worker,
                    allocation: Allocation::for_worker(worker),
                })
                .allocation
                .push(task.clone());
            ledger.add(&worker.id, task.hours());

            if overflow {
                log::warn!(
                    "Task {} fits no matched worker; placing it on {} to avoid dropping it",
                    task.id,
                    worker.name
                );
            } else {
                log::debug!("Consolidated {} onto {} (adjusted cost {cost:.2})", task.id, worker.name);
            }
            events.push(AllocEvent::TaskConsolidated {
                task_id: task.id.clone(),
                worker_id: worker.id.clone(),
                adjusted_cost: cost,
                reused,
                overflow,
            });
        }

        let allocations: Vec<Allocation> = assignments
            .into_values()
            .map(|Assignment { worker, mut allocation }| {
                let cost = cost_scores.get(&worker.id).copied().unwrap_or_default();
                allocation.reasoning = format!(
                    "Consolidated {} task(s) totaling {}h onto {} (role: {}, cost efficiency: {cost:.2})",
                    allocation.tasks.len(),
                    allocation.total_estimated_hours,
                    worker.name,
                    worker.role,
                );
                allocation
            })
            .collect();

        events.push(AllocEvent::ConsolidationCompleted {
            allocated: allocations.iter().map(|a| a.tasks.len()).sum(),
            dropped: dropped.len(),
            workers_used: allocations.len(),
        });
        log::info!(
            "Consolidation: {} task(s) onto {} worker(s), {} dropped",
            tasks.len() - dropped.len(),
            allocations.len(),
            dropped.len()
        );

        ConsolidationOutcome {
            allocations,
            dropped,
            ledger,
            cost_scores,
            events,
        }
    }

    /// Cheapest worker in `pool` that can still hold `task` under hard
    /// capacity. Iteration is in id order with a strict `<`, so equal costs
    /// go to the lowest id.
    fn cheapest<'r>(
        &self,
        task: &Task,
        pool: &[&'r Worker],
        assignments: &BTreeMap<WorkerId, Assignment<'r>>,
        cost_scores: &BTreeMap<WorkerId, f64>,
    ) -> Option<(&'r Worker, f64)> {
        let mut best: Option<(&'r Worker, f64)> = None;
        for &worker in pool {
            let assigned = assignments.get(&worker.id);
            let held = assigned.map_or(0.0, Assignment::hours);
            let available = worker.capacity_hours_per_week - worker.current_workload_hours;
            if held + task.hours() > available {
                continue;
            }

            let mut cost = cost_scores.get(&worker.id).copied().unwrap_or(f64::INFINITY);
            if assigned.is_some() {
                cost *= self.config.consolidation.reuse_multiplier;
            }
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((worker, cost));
            }
        }
        best
    }
}

/// Priority descending, then hours descending. Stable.
pub fn sorted_for_consolidation(tasks: &[Task]) -> Vec<&Task> {
    let mut order: Vec<&Task> = tasks.iter().collect();
    order.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.estimated_hours.cmp(&a.estimated_hours))
    });
    order
}
