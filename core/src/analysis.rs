//! Task-set analysis and completion-date estimates.
//!
//! Read-only summaries for planners. Nothing here feeds back into matching.

use crate::{
    config::TimelineConfig,
    task::{Complexity, Priority, Task},
    types::TaskId,
    worker::Worker,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskAnalysis {
    pub total_tasks: usize,
    pub categories: BTreeMap<String, usize>,
    /// (skill, task count), most demanded first.
    pub skill_demand: Vec<(String, usize)>,
    pub complexity_breakdown: BTreeMap<String, usize>,
    pub timeline: TimelineEstimate,
    pub dependencies: Vec<DependencyLink>,
    /// Dependency ids that name no task in the set.
    pub dangling_dependencies: Vec<DependencyLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEstimate {
    pub total_estimated_hours: u64,
    pub estimated_weeks: f64,
    pub estimated_months: f64,
    /// Weeks of High and Critical work, a rough lower bound on delivery.
    pub critical_path_weeks: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyLink {
    pub task_id: TaskId,
    pub title: String,
    pub depends_on: Vec<TaskId>,
}

impl TaskAnalysis {
    pub fn of(tasks: &[Task], timeline: &TimelineConfig) -> Self {
        let mut categories = BTreeMap::new();
        let mut skills: HashMap<String, usize> = HashMap::new();
        let mut complexity_breakdown: BTreeMap<String, usize> = [
            Complexity::Low,
            Complexity::Medium,
            Complexity::High,
        ]
        .iter()
        .map(|c| (c.as_str().to_string(), 0))
        .collect();

        for task in tasks {
            *categories.entry(task.category.clone()).or_insert(0) += 1;
            for skill in task.required_skill_set() {
                *skills.entry(skill).or_insert(0) += 1;
            }
            *complexity_breakdown
                .entry(task.complexity.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut skill_demand: Vec<_> = skills.into_iter().collect();
        skill_demand.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut dependencies = Vec::new();
        let mut dangling_dependencies = Vec::new();
        for task in tasks.iter().filter(|t| !t.dependencies.is_empty()) {
            dependencies.push(DependencyLink {
                task_id: task.id.clone(),
                title: task.title.clone(),
                depends_on: task.dependencies.clone(),
            });
            let missing: Vec<_> = task
                .dependencies
                .iter()
                .filter(|d| !known.contains(d.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                log::warn!("Task {} depends on unknown task(s): {missing:?}", task.id);
                dangling_dependencies.push(DependencyLink {
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    depends_on: missing,
                });
            }
        }

        Self {
            total_tasks: tasks.len(),
            categories,
            skill_demand,
            complexity_breakdown,
            timeline: TimelineEstimate::of(tasks, timeline),
            dependencies,
            dangling_dependencies,
        }
    }
}

impl TimelineEstimate {
    pub fn of(tasks: &[Task], cfg: &TimelineConfig) -> Self {
        let total: u64 = tasks.iter().map(|t| u64::from(t.estimated_hours)).sum();
        let urgent: u64 = tasks
            .iter()
            .filter(|t| t.priority >= Priority::High)
            .map(|t| u64::from(t.estimated_hours))
            .sum();
        let per_week = cfg.productive_hours_per_week;
        Self {
            total_estimated_hours: total,
            estimated_weeks: round1(total as f64 / per_week),
            estimated_months: round1(total as f64 / (per_week * cfg.weeks_per_month)),
            critical_path_weeks: round1(urgent as f64 / per_week),
        }
    }
}

/// When `worker` would finish `hours` of work started at `start`, given the
/// free capacity they had at run start.
pub fn estimate_completion(
    hours: u32,
    worker: &Worker,
    cfg: &TimelineConfig,
    start: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut per_day = worker.available_hours() / cfg.working_days_per_week;
    if per_day <= 0.0 {
        per_day = cfg.min_hours_per_day;
    }
    let days = (f64::from(hours) / per_day).max(1.0);
    start + Duration::seconds((days * 86_400.0).round() as i64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
