//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The controller reaches it through the SnapshotPort trait and never
//! executes SQL directly.

use crate::{
    error::GameResult,
    journal::JournalEntry,
    snapshot::{self, SnapshotPort, SNAPSHOT_SLOT},
    state::GameState,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct GameStore {
    conn: Connection,
    slot: String,
}

impl GameStore {
    /// Open (or create) the game database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::warn!("could not enable WAL for {path}: {e}");
        }
        Ok(Self {
            conn,
            slot: SNAPSHOT_SLOT.to_string(),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            slot: SNAPSHOT_SLOT.to_string(),
        })
    }

    /// Use a different snapshot key for load/save through the port.
    pub fn with_slot(mut self, slot: &str) -> Self {
        self.slot = slot.to_string();
        self
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_transition_log.sql"))?;
        Ok(())
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, slot: &str, state_json: &str) -> GameResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO game_snapshot (slot, state_json, saved_at)
             VALUES (?1, ?2, ?3)",
            params![slot, state_json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn snapshot_payload(&self, slot: &str) -> GameResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT state_json FROM game_snapshot WHERE slot = ?1",
                params![slot],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// When the slot was last written. None if never, or if the
    /// timestamp column holds something unparseable.
    pub fn saved_at(&self, slot: &str) -> GameResult<Option<DateTime<Utc>>> {
        let raw = self
            .conn
            .query_row(
                "SELECT saved_at FROM game_snapshot WHERE slot = ?1",
                params![slot],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(raw.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|t| t.with_timezone(&Utc))
        }))
    }

    pub fn clear_snapshot(&self, slot: &str) -> GameResult<()> {
        self.conn.execute(
            "DELETE FROM game_snapshot WHERE slot = ?1",
            params![slot],
        )?;
        Ok(())
    }

    // ── Transition journal ─────────────────────────────────────

    pub fn append_transition(&self, entry: &JournalEntry) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO transition_log
                 (run_id, seq, action, phase_before, phase_after, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.run_id,
                entry.seq as i64,
                entry.action,
                entry.phase_before,
                entry.phase_after,
                entry.payload,
                entry.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn transitions_for_run(&self, run_id: &str) -> GameResult<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, action, phase_before, phase_after, payload, recorded_at
             FROM transition_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(JournalEntry {
                    id:           Some(row.get(0)?),
                    run_id:       row.get(1)?,
                    seq:          row.get::<_, i64>(2)? as u64,
                    action:       row.get(3)?,
                    phase_before: row.get(4)?,
                    phase_after:  row.get(5)?,
                    payload:      row.get(6)?,
                    recorded_at:  row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn transition_count(&self, run_id: &str) -> GameResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transition_log WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl SnapshotPort for GameStore {
    fn load(&self) -> Option<GameState> {
        match self.snapshot_payload(&self.slot) {
            Ok(Some(payload)) => snapshot::decode(&payload),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cannot read snapshot slot '{}': {e}", self.slot);
                None
            }
        }
    }

    fn save(&self, state: &GameState) -> GameResult<()> {
        let payload = snapshot::encode(state)?;
        self.save_snapshot(&self.slot, &payload)
    }

    fn record_transition(&self, entry: &JournalEntry) -> GameResult<()> {
        self.append_transition(entry)
    }
}
