//! Transition journal: the append-only record of applied actions.
//!
//! RULE: Only transitions that changed the state are journaled.
//! Rejected actions (wrong phase, failed precondition) leave no trace.

use crate::types::RunId;
use serde::{Deserialize, Serialize};

/// One journal row as persisted to SQLite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id:           Option<i64>,
    pub run_id:       RunId,
    /// 1-based position within the run.
    pub seq:          u64,
    pub action:       String,
    pub phase_before: String,
    pub phase_after:  String,
    pub payload:      String, // JSON-serialized PlayerAction
    pub recorded_at:  String, // RFC 3339
}
