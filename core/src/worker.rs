//! Worker model and roster.
//!
//! Workers arrive as external records. They are validated and normalized
//! once, when a `Roster` is built, and are read-only for the rest of the run.
//! Load consumed during a run lives in the `CapacityLedger`, never here.

use crate::{
    error::{AllocError, AllocResult},
    types::{Hours, WorkerId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_CAPACITY_HOURS: Hours = 40.0;
pub const DEFAULT_PERFORMANCE_RATING: f64 = 4.0;
pub const MAX_PERFORMANCE_RATING: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub seniority: Seniority,
    #[serde(default = "default_capacity")]
    pub capacity_hours_per_week: Hours,
    #[serde(default)]
    pub current_workload_hours: Hours,
    /// Task categories this worker prefers (e.g. "backend").
    #[serde(default)]
    pub preferences: BTreeSet<String>,
    #[serde(default = "default_rating")]
    pub performance_rating: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Record version used for optimistic workload commits.
    #[serde(default)]
    pub version: u64,
}

fn default_capacity() -> Hours {
    DEFAULT_CAPACITY_HOURS
}

fn default_rating() -> f64 {
    DEFAULT_PERFORMANCE_RATING
}

fn default_active() -> bool {
    true
}

impl Worker {
    /// A worker with defaults for everything but identity. Mostly for tests
    /// and generated scenarios.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: Role::default(),
            skills: BTreeSet::new(),
            seniority: Seniority::default(),
            capacity_hours_per_week: DEFAULT_CAPACITY_HOURS,
            current_workload_hours: 0.0,
            preferences: BTreeSet::new(),
            performance_rating: DEFAULT_PERFORMANCE_RATING,
            is_active: true,
            version: 0,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seniority(mut self, seniority: Seniority) -> Self {
        self.seniority = seniority;
        self
    }

    pub fn with_capacity(mut self, capacity: Hours, current_workload: Hours) -> Self {
        self.capacity_hours_per_week = capacity;
        self.current_workload_hours = current_workload;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.performance_rating = rating;
        self
    }

    /// Hours still free at run start, never negative.
    pub fn available_hours(&self) -> Hours {
        (self.capacity_hours_per_week - self.current_workload_hours).max(0.0)
    }

    /// Workload as a percentage of capacity at run start.
    pub fn workload_pct(&self) -> f64 {
        if self.capacity_hours_per_week <= 0.0 {
            return 100.0;
        }
        100.0 * self.current_workload_hours / self.capacity_hours_per_week
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        let wanted = skill.trim().to_lowercase();
        self.skills.iter().any(|s| s.trim().to_lowercase() == wanted)
    }

    pub fn validate(&self) -> AllocResult<()> {
        let invalid = |reason: &str| AllocError::InvalidWorker {
            worker_id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !self.capacity_hours_per_week.is_finite() || self.capacity_hours_per_week <= 0.0 {
            return Err(invalid("capacity_hours_per_week must be positive"));
        }
        if !self.current_workload_hours.is_finite() || self.current_workload_hours < 0.0 {
            return Err(invalid("current_workload_hours must be >= 0"));
        }
        if !(0.0..=MAX_PERFORMANCE_RATING).contains(&self.performance_rating) {
            return Err(invalid("performance_rating must be within [0, 5]"));
        }
        Ok(())
    }

    /// Lowercase, trimmed, de-duplicated skill and preference tags.
    pub fn normalized(mut self) -> Self {
        self.skills = normalize_tags(&self.skills);
        self.preferences = normalize_tags(&self.preferences);
        self
    }
}

fn normalize_tags(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

// ── Role ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Developer,
    Designer,
    ProductManager,
    QaEngineer,
    DevopsEngineer,
    DataScientist,
    Architect,
    /// Any role outside the known taxonomy. Costs the table's default multiplier.
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::Designer => "designer",
            Self::ProductManager => "product_manager",
            Self::QaEngineer => "qa_engineer",
            Self::DevopsEngineer => "devops_engineer",
            Self::DataScientist => "data_scientist",
            Self::Architect => "architect",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Seniority ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    #[serde(alias = "Junior")]
    Junior,
    #[default]
    #[serde(alias = "Mid")]
    Mid,
    #[serde(alias = "Senior")]
    Senior,
}

impl Seniority {
    /// Ordinal level, comparable with `Complexity::level`.
    pub fn level(self) -> u8 {
        match self {
            Self::Junior => 1,
            Self::Mid => 2,
            Self::Senior => 3,
        }
    }
}

// ── Roster ────────────────────────────────────────────────────────

/// The validated set of allocation candidates for one run.
///
/// Workers are sorted by id, so iteration order is also the tie-break order
/// ("lowest id wins"). Inactive workers are dropped here.
#[derive(Debug, Clone)]
pub struct Roster {
    workers: Vec<Worker>,
}

impl Roster {
    pub fn new(workers: Vec<Worker>) -> AllocResult<Self> {
        let mut seen = HashSet::new();
        let mut active = Vec::with_capacity(workers.len());
        let mut skipped = 0usize;

        for worker in workers {
            worker.validate()?;
            if !seen.insert(worker.id.clone()) {
                return Err(AllocError::DuplicateWorker { worker_id: worker.id });
            }
            if !worker.is_active {
                skipped += 1;
                continue;
            }
            active.push(worker.normalized());
        }

        if skipped > 0 {
            log::debug!("Roster: skipped {skipped} inactive worker(s)");
        }
        if active.is_empty() {
            return Err(AllocError::NoWorkersAvailable);
        }

        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { workers: active })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Worker> {
        self.workers.iter()
    }

    pub fn get(&self, worker_id: &str) -> Option<&Worker> {
        self.workers
            .binary_search_by(|w| w.id.as_str().cmp(worker_id))
            .ok()
            .map(|i| &self.workers[i])
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// A sub-roster holding only the given ids, in roster order.
    pub(crate) fn restricted_to(&self, ids: &BTreeSet<WorkerId>) -> Vec<&Worker> {
        self.workers.iter().filter(|w| ids.contains(&w.id)).collect()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Worker;
    type IntoIter = std::slice::Iter<'a, Worker>;

    fn into_iter(self) -> Self::IntoIter {
        self.workers.iter()
    }
}
