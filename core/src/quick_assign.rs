//! Single-task fast path.
//!
//! For a lone, simple task there is nothing to consolidate: pick the most
//! cost-efficient worker who shares a required skill and still has headroom.
//! The due date is a flat turnaround from the run's start time:
//! urgent work gets 1 day up to 4h (else 2), everything else 3 days up to 8h (else 5).

use crate::{
    allocation::Allocation,
    config::AllocConfig,
    scorer::Scorer,
    task::{Priority, Task},
    worker::{Roster, Worker},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickAssignment {
    pub allocation: Allocation,
    pub cost_efficiency: f64,
    /// False when no worker shared a required skill and the whole roster was used.
    pub skills_matched: bool,
    /// False when every candidate was at or above the fully-utilized line.
    pub had_headroom: bool,
    pub due_at: DateTime<Utc>,
}

/// Calendar days allowed for a directly assigned task.
pub fn turnaround_days(task: &Task) -> i64 {
    match task.priority {
        Priority::Critical | Priority::High if task.estimated_hours <= 4 => 1,
        Priority::Critical | Priority::High => 2,
        _ if task.estimated_hours <= 8 => 3,
        _ => 5,
    }
}

pub fn quick_assign(
    task: &Task,
    roster: &Roster,
    config: &AllocConfig,
    started_at: DateTime<Utc>,
) -> QuickAssignment {
    let scorer = Scorer::new(config);

    let mut ranked: Vec<(&Worker, f64)> = roster
        .iter()
        .map(|w| (w, scorer.cost_efficiency(w)))
        .collect();
    // Stable: equal costs stay in id order.
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let required = task.required_skill_set();
    let skilled: Vec<(&Worker, f64)> = ranked
        .iter()
        .copied()
        .filter(|(w, _)| required.iter().any(|s| w.has_skill(s)))
        .collect();
    let skills_matched = required.is_empty() || !skilled.is_empty();
    let pool = if skilled.is_empty() {
        if !required.is_empty() {
            log::warn!("No worker has any of {required:?}; considering the whole roster");
        }
        ranked
    } else {
        skilled
    };

    let headroom_pct = config.utilization.fully_utilized * 100.0;
    let with_headroom = pool.iter().find(|(w, _)| w.workload_pct() < headroom_pct).copied();
    let had_headroom = with_headroom.is_some();
    // Roster is never empty, so the pool isn't either.
    let (worker, cost) = with_headroom.unwrap_or(pool[0]);

    let mut allocation = Allocation::for_worker(worker);
    allocation.push(task.clone());
    allocation.reasoning = format!(
        "Direct assignment of '{}' ({}h) to {} (role: {}, cost efficiency: {cost:.2}, skills match: {})",
        task.title,
        task.estimated_hours,
        worker.name,
        worker.role,
        if required.is_empty() {
            "not required"
        } else if skills_matched {
            "yes"
        } else {
            "no"
        },
    );
    let due_at = started_at + Duration::days(turnaround_days(task));
    log::info!("Quick-assigned {} to {} (due {})", task.id, worker.name, due_at.format("%Y-%m-%d"));

    QuickAssignment {
        allocation,
        cost_efficiency: cost,
        skills_matched,
        had_headroom,
        due_at,
    }
}
