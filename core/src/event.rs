//! The run audit log.
//!
//! RULE: every allocation decision a run makes is recorded as an event, in
//! the order it was made. Events are data only; nothing reads them back to
//! make decisions.

use crate::{
    allocation::UnallocatedReason,
    types::{RunId, TaskId, WorkerId},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocEvent {
    // ── Run ────────────────────────────────────────
    RunStarted {
        run_id: RunId,
        task_count: usize,
        worker_count: usize,
    },
    RunCompleted {
        run_id: RunId,
        allocated: usize,
        unallocated: usize,
        workers_used: usize,
    },

    // ── Matching ───────────────────────────────────
    TaskMatched {
        task_id: TaskId,
        worker_id: WorkerId,
        score: f64,
    },
    TaskUnmatched {
        task_id: TaskId,
        reason: UnallocatedReason,
        best_score: Option<f64>,
    },
    MatchingCompleted {
        allocated: usize,
        unallocated: usize,
        workers_used: usize,
    },

    // ── Consolidation ──────────────────────────────
    TaskConsolidated {
        task_id: TaskId,
        worker_id: WorkerId,
        adjusted_cost: f64,
        reused: bool,
        /// Placed outside the matcher's workers because none of them had room.
        #[serde(default)]
        overflow: bool,
    },
    TaskDropped {
        task_id: TaskId,
        hours: u32,
    },
    ConsolidationCompleted {
        allocated: usize,
        dropped: usize,
        workers_used: usize,
    },
}

impl AllocEvent {
    /// Stable event name, used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::RunCompleted { .. } => "run_completed",
            Self::TaskMatched { .. } => "task_matched",
            Self::TaskUnmatched { .. } => "task_unmatched",
            Self::MatchingCompleted { .. } => "matching_completed",
            Self::TaskConsolidated { .. } => "task_consolidated",
            Self::TaskDropped { .. } => "task_dropped",
            Self::ConsolidationCompleted { .. } => "consolidation_completed",
        }
    }

    /// The phase that emitted this event.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } | Self::RunCompleted { .. } => "engine",
            Self::TaskMatched { .. }
            | Self::TaskUnmatched { .. }
            | Self::MatchingCompleted { .. } => "matcher",
            Self::TaskConsolidated { .. }
            | Self::TaskDropped { .. }
            | Self::ConsolidationCompleted { .. } => "optimizer",
        }
    }
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub seq: u64,
    pub phase: String,
    pub event_type: String,
    pub payload: String,
}

impl EventLogEntry {
    pub fn from_event(run_id: &str, seq: u64, event: &AllocEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            run_id: run_id.to_string(),
            seq,
            phase: event.phase().to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
        })
    }
}
