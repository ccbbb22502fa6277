//! Pure scoring over (worker, task) pairs.
//!
//! These formulas are a ranking contract: both phases order candidates by
//! them, so weights and caps come from `AllocConfig` and nowhere else.

use crate::{
    config::AllocConfig,
    task::Task,
    types::Hours,
    worker::Worker,
};

/// Stateless scorer bound to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    config: &'a AllocConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a AllocConfig) -> Self {
        Self { config }
    }

    /// Skill overlap in [0, 1], plus seniority and preference bonuses, capped at 1.
    ///
    /// A task with no required skills is a neutral match and gets no bonuses.
    pub fn skill_match(&self, worker: &Worker, task: &Task) -> f64 {
        let s = &self.config.scoring;
        let required = task.required_skill_set();
        if required.is_empty() {
            return s.neutral_skill_match;
        }

        let matching = required.iter().filter(|skill| worker.has_skill(skill)).count();
        let mut score = matching as f64 / required.len() as f64;

        if worker.seniority.level() >= task.complexity.level() {
            score += s.seniority_bonus;
        }

        let category = task.category.trim().to_lowercase();
        if worker
            .preferences
            .iter()
            .any(|p| p.trim().to_lowercase() == category)
        {
            score += s.preference_bonus;
        }

        score.min(1.0)
    }

    /// Share of capacity still free given `ledger_load` hours consumed.
    pub fn availability_ratio(&self, worker: &Worker, ledger_load: Hours) -> f64 {
        let capacity = worker.capacity_hours_per_week;
        if capacity <= 0.0 {
            return 0.0;
        }
        (capacity - ledger_load).max(0.0) / capacity
    }

    /// Weighted matcher score for assigning `task` to `worker` at `ledger_load`.
    pub fn allocation_score(&self, worker: &Worker, task: &Task, ledger_load: Hours) -> f64 {
        let s = &self.config.scoring;
        s.skill_weight * self.skill_match(worker, task)
            + s.availability_weight * self.availability_ratio(worker, ledger_load)
            + s.performance_weight * (worker.performance_rating / s.max_performance_rating)
    }

    /// Cost of handing this worker more work; lower is better.
    ///
    /// Computed from the run-start snapshot: role multiplier minus an
    /// availability bonus and a skill-breadth bonus, floored.
    pub fn cost_efficiency(&self, worker: &Worker) -> f64 {
        let c = &self.config.cost;
        let multiplier = c.multiplier(worker.role);
        let availability_bonus = ((100.0 - worker.workload_pct()) / 100.0).max(0.0);
        let skills_bonus = (worker.skills.len() as f64 / c.skills_divisor).min(c.skills_bonus_cap);
        (multiplier - availability_bonus - skills_bonus).max(c.floor)
    }
}
