//! Task model.
//!
//! Tasks are read-only inputs. `dependencies` are carried through untouched;
//! allocation never waits on them.

use crate::{
    error::{AllocError, AllocResult},
    types::TaskId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    pub estimated_hours: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

fn default_category() -> String {
    "Other".to_string()
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, estimated_hours: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: default_category(),
            skills_required: Vec::new(),
            estimated_hours,
            priority: Priority::default(),
            complexity: Complexity::default(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills_required = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Required skills as a lowercase set.
    pub fn required_skill_set(&self) -> BTreeSet<String> {
        self.skills_required
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn hours(&self) -> f64 {
        f64::from(self.estimated_hours)
    }

    pub fn validate(&self) -> AllocResult<()> {
        if self.id.trim().is_empty() {
            return Err(AllocError::InvalidTask {
                task_id: self.id.clone(),
                reason: "id must not be empty".into(),
            });
        }
        if self.estimated_hours == 0 {
            return Err(AllocError::InvalidTask {
                task_id: self.id.clone(),
                reason: "estimated_hours must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Validate every task and reject duplicate ids.
pub fn validate_tasks(tasks: &[Task]) -> AllocResult<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()?;
        if !seen.insert(task.id.as_str()) {
            return Err(AllocError::DuplicateTask {
                task_id: task.id.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Critical")]
    Critical,
}

impl Priority {
    pub fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Complexity {
    pub fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}
