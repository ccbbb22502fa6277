//! Shared primitive types used across the allocation engine.

/// Stable identifier of a worker on the roster.
pub type WorkerId = String;

/// Stable identifier of a task.
pub type TaskId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Hours of work. Capacities and loads are fractional; task estimates are whole.
pub type Hours = f64;
