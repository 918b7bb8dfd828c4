//! Shared primitive types used across the entire engine.

/// Signed currency amount in rupees.
pub type Rupees = f64;

/// Stable identifier of a saving goal in the goal catalog.
pub type GoalId = String;

/// Stable identifier of an entry in the event catalog.
pub type EventId = String;

/// The canonical controller-session identifier used by the journal.
pub type RunId = String;

pub const MONTHS_PER_YEAR: u32 = 12;
