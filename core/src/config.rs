//! Engine configuration.
//!
//! Every weight, bonus, threshold and the role cost table lives here and is
//! injected into the scorer and phases. A config file only overrides what it
//! names; everything else keeps its default.

use crate::{
    error::{AllocError, AllocResult},
    worker::Role,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AllocConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    #[serde(default)]
    pub utilization: UtilizationThresholds,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

// ── Scoring ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub skill_weight: f64,
    pub availability_weight: f64,
    pub performance_weight: f64,
    /// Skill match reported when a task requires no skills.
    pub neutral_skill_match: f64,
    pub seniority_bonus: f64,
    pub preference_bonus: f64,
    pub max_performance_rating: f64,
    /// A matcher candidate must score strictly above this.
    pub min_allocation_score: f64,
    /// Fraction of a task's hours a worker must have free to be considered.
    pub min_free_capacity_fraction: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.5,
            availability_weight: 0.3,
            performance_weight: 0.2,
            neutral_skill_match: 0.5,
            seniority_bonus: 0.10,
            preference_bonus: 0.15,
            max_performance_rating: 5.0,
            min_allocation_score: 0.3,
            min_free_capacity_fraction: 0.5,
        }
    }
}

// ── Cost efficiency ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub role_multipliers: HashMap<Role, f64>,
    /// Multiplier for roles missing from `role_multipliers`.
    pub default_multiplier: f64,
    pub skills_divisor: f64,
    pub skills_bonus_cap: f64,
    pub floor: f64,
}

impl CostConfig {
    pub fn multiplier(&self, role: Role) -> f64 {
        self.role_multipliers
            .get(&role)
            .copied()
            .unwrap_or(self.default_multiplier)
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        let role_multipliers = [
            (Role::QaEngineer, 0.8),
            (Role::Developer, 1.0),
            (Role::Designer, 1.2),
            (Role::DevopsEngineer, 1.3),
            (Role::ProductManager, 1.5),
            (Role::DataScientist, 1.8),
            (Role::Architect, 2.0),
        ]
        .into_iter()
        .collect();
        Self {
            role_multipliers,
            default_multiplier: 1.0,
            skills_divisor: 10.0,
            skills_bonus_cap: 0.5,
            floor: 0.1,
        }
    }
}

// ── Consolidation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePool {
    /// Workers the matcher assigned work to, with the rest of the roster as
    /// overflow for tasks none of them can hold.
    #[default]
    MatchedWorkers,
    /// Every active worker on the roster, on equal terms.
    FullRoster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Cost multiplier applied to workers already holding work this pass.
    pub reuse_multiplier: f64,
    pub candidate_pool: CandidatePool,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            reuse_multiplier: 0.7,
            candidate_pool: CandidatePool::MatchedWorkers,
        }
    }
}

// ── Utilization ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationThresholds {
    pub fully_utilized: f64,
    pub overloaded: f64,
}

impl Default for UtilizationThresholds {
    fn default() -> Self {
        Self {
            fully_utilized: 0.9,
            overloaded: 1.0,
        }
    }
}

// ── Timeline ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub productive_hours_per_week: f64,
    pub working_days_per_week: f64,
    /// Assumed daily throughput for a worker with no free capacity.
    pub min_hours_per_day: f64,
    pub weeks_per_month: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            productive_hours_per_week: 30.0,
            working_days_per_week: 5.0,
            min_hours_per_day: 2.0,
            weeks_per_month: 4.0,
        }
    }
}

impl AllocConfig {
    /// Load from a JSON file. Missing sections and fields keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AllocConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AllocResult<()> {
        let s = &self.scoring;
        let weights = [
            ("scoring.skill_weight", s.skill_weight),
            ("scoring.availability_weight", s.availability_weight),
            ("scoring.performance_weight", s.performance_weight),
            ("scoring.neutral_skill_match", s.neutral_skill_match),
            ("scoring.seniority_bonus", s.seniority_bonus),
            ("scoring.preference_bonus", s.preference_bonus),
            ("scoring.min_allocation_score", s.min_allocation_score),
            ("scoring.min_free_capacity_fraction", s.min_free_capacity_fraction),
            ("cost.default_multiplier", self.cost.default_multiplier),
            ("cost.skills_bonus_cap", self.cost.skills_bonus_cap),
            ("cost.floor", self.cost.floor),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (role, m) in &self.cost.role_multipliers {
            if !m.is_finite() || *m < 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "cost.role_multipliers.{role} must be a non-negative number, got {m}"
                )));
            }
        }
        let positive = [
            ("scoring.max_performance_rating", s.max_performance_rating),
            ("cost.skills_divisor", self.cost.skills_divisor),
            ("timeline.productive_hours_per_week", self.timeline.productive_hours_per_week),
            ("timeline.working_days_per_week", self.timeline.working_days_per_week),
            ("timeline.min_hours_per_day", self.timeline.min_hours_per_day),
            ("timeline.weeks_per_month", self.timeline.weeks_per_month),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let reuse = self.consolidation.reuse_multiplier;
        if !(reuse > 0.0 && reuse <= 1.0) {
            return Err(AllocError::InvalidConfig(format!(
                "consolidation.reuse_multiplier must be within (0, 1], got {reuse}"
            )));
        }
        if self.utilization.fully_utilized > self.utilization.overloaded {
            return Err(AllocError::InvalidConfig(
                "utilization.fully_utilized must not exceed utilization.overloaded".into(),
            ));
        }
        Ok(())
    }
}
