//! Snapshot serialization and the persistence port.
//!
//! A snapshot is the complete GameState as one JSON blob under a
//! fixed slot key. It is written after every applied transition and
//! read once at startup.
//!
//! RULE: A snapshot that fails to parse, or parses into an incoherent
//! state, is discarded. Callers then start from the initial state;
//! the failure is never surfaced as an error.

use crate::{error::GameResult, journal::JournalEntry, state::GameState};
use std::cell::RefCell;

/// The fixed identifier the snapshot is stored under.
pub const SNAPSHOT_SLOT: &str = "krishicash_game_state";

pub fn encode(state: &GameState) -> GameResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a stored payload. None for anything unusable.
pub fn decode(payload: &str) -> Option<GameState> {
    match serde_json::from_str::<GameState>(payload) {
        Ok(state) if state.is_coherent() => Some(state),
        Ok(_) => {
            log::warn!("Discarding snapshot: state fails coherence checks");
            None
        }
        Err(e) => {
            log::warn!("Discarding unparseable snapshot: {e}");
            None
        }
    }
}

/// The contract the controller consumes for persistence.
pub trait SnapshotPort {
    /// The last saved state, or None when absent or unusable.
    fn load(&self) -> Option<GameState>;

    fn save(&self, state: &GameState) -> GameResult<()>;

    /// Journal hook. Ports without a journal ignore entries.
    fn record_transition(&self, _entry: &JournalEntry) -> GameResult<()> {
        Ok(())
    }
}

/// Single-slot in-process port. Holds the encoded payload so that
/// load/save exercise the same codec as the SQLite store.
#[derive(Debug, Default)]
pub struct MemorySnapshots {
    payload: RefCell<Option<String>>,
    journal: RefCell<Vec<JournalEntry>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored payload with arbitrary text.
    pub fn put_raw(&self, payload: &str) {
        *self.payload.borrow_mut() = Some(payload.to_string());
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.borrow().clone()
    }
}

impl SnapshotPort for MemorySnapshots {
    fn load(&self) -> Option<GameState> {
        self.payload.borrow().as_deref().and_then(decode)
    }

    fn save(&self, state: &GameState) -> GameResult<()> {
        let payload = encode(state)?;
        *self.payload.borrow_mut() = Some(payload);
        Ok(())
    }

    fn record_transition(&self, entry: &JournalEntry) -> GameResult<()> {
        self.journal.borrow_mut().push(entry.clone());
        Ok(())
    }
}

impl<P: SnapshotPort + ?Sized> SnapshotPort for std::rc::Rc<P> {
    fn load(&self) -> Option<GameState> {
        (**self).load()
    }

    fn save(&self, state: &GameState) -> GameResult<()> {
        (**self).save(state)
    }

    fn record_transition(&self, entry: &JournalEntry) -> GameResult<()> {
        (**self).record_transition(entry)
    }
}
