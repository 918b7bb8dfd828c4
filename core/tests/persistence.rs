//! Snapshot store and persistence-port tests.

use krishicash_core::{
    action::PlayerAction,
    config::GameConfig,
    engine::GameEngine,
    error::{GameError, GameResult},
    journal::JournalEntry,
    rng::ScriptedRng,
    snapshot::{self, MemorySnapshots, SnapshotPort, SNAPSHOT_SLOT},
    state::{GameState, Phase},
    store::GameStore,
};
use std::cell::Cell;
use std::rc::Rc;

/// Wraps a memory port and fails the writes it is told to fail.
#[derive(Default)]
struct UnreliablePort {
    inner:          MemorySnapshots,
    refuse_saves:   Cell<bool>,
    refuse_journal: Cell<bool>,
}

impl SnapshotPort for UnreliablePort {
    fn load(&self) -> Option<GameState> {
        self.inner.load()
    }

    fn save(&self, state: &GameState) -> GameResult<()> {
        if self.refuse_saves.get() {
            return Err(GameError::Other(anyhow::anyhow!("disk full")));
        }
        self.inner.save(state)
    }

    fn record_transition(&self, entry: &JournalEntry) -> GameResult<()> {
        if self.refuse_journal.get() {
            return Err(GameError::Other(anyhow::anyhow!("journal locked")));
        }
        self.inner.record_transition(entry)
    }
}

fn build_store() -> GameStore {
    let store = GameStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

/// A state some way into a run, with history and an event in hand.
fn played_state() -> GameState {
    let mut engine = GameEngine::new(GameConfig::builtin(), Box::new(ScriptedRng::new([2, 4, 7])));
    let script = [
        PlayerAction::Start,
        PlayerAction::StartMonth,
        PlayerAction::ResolveEvent,
        PlayerAction::BuyInsurance,
        PlayerAction::TakeLoan { amount: 5000.0 },
        PlayerAction::Save { amount: 3000.0 },
        PlayerAction::EndMonth,
        PlayerAction::ContinueMonth,
        PlayerAction::StartMonth,
    ];
    for action in script {
        assert!(engine.dispatch(action.clone()).unwrap(), "{} rejected", action.name());
    }
    engine.state().clone()
}

#[test]
fn store_round_trips_state() {
    let store = build_store();
    let state = played_state();

    store.save(&state).expect("save");
    let loaded = store.load().expect("snapshot present");

    assert_eq!(loaded, state);
    assert!(store.saved_at(SNAPSHOT_SLOT).unwrap().is_some());
}

#[test]
fn empty_store_loads_nothing() {
    let store = build_store();
    assert!(store.load().is_none());
    assert!(store.saved_at(SNAPSHOT_SLOT).unwrap().is_none());
}

#[test]
fn later_save_replaces_earlier() {
    let store = build_store();
    let config = GameConfig::builtin();

    store.save(&GameState::initial(&config)).unwrap();
    let state = played_state();
    store.save(&state).unwrap();

    assert_eq!(store.load(), Some(state));
}

#[test]
fn slots_are_independent() {
    let store = build_store().with_slot("second_household");
    let state = played_state();
    store.save(&state).unwrap();

    assert_eq!(store.slot(), "second_household");
    assert!(store.snapshot_payload(SNAPSHOT_SLOT).unwrap().is_none());

    store.clear_snapshot("second_household").unwrap();
    assert!(store.load().is_none());
}

#[test]
fn corrupt_payload_resumes_from_initial_state() {
    let config = GameConfig::builtin();
    let store = build_store();
    store.save_snapshot(SNAPSHOT_SLOT, "{\"year\": 2, \"month\": ").unwrap();

    assert!(store.load().is_none());

    let engine = GameEngine::resume(
        config.clone(),
        Box::new(ScriptedRng::constant(0)),
        Box::new(store),
    );
    assert_eq!(engine.state(), &GameState::initial(&config));
}

#[test]
fn incompatible_shape_is_discarded() {
    assert!(snapshot::decode("{\"month\": 3, \"balance\": 100}").is_none());
    assert!(snapshot::decode("[]").is_none());
    assert!(snapshot::decode("").is_none());
}

#[test]
fn incoherent_state_is_discarded() {
    let config = GameConfig::builtin();
    let bad_month = GameState { month: 13, ..GameState::initial(&config) };
    let bad_debt = GameState { debt: -10.0, ..GameState::initial(&config) };

    let json = snapshot::encode(&bad_month).unwrap();
    assert!(snapshot::decode(&json).is_none());
    let json = snapshot::encode(&bad_debt).unwrap();
    assert!(snapshot::decode(&json).is_none());
}

#[test]
fn memory_port_round_trips_and_tolerates_garbage() {
    let port = MemorySnapshots::new();
    assert!(port.load().is_none());

    let state = played_state();
    port.save(&state).unwrap();
    assert_eq!(port.load(), Some(state));

    port.put_raw("not json at all");
    assert!(port.load().is_none());
}

#[test]
fn engine_persists_every_applied_transition() {
    let config = GameConfig::builtin();
    let store = Rc::new(build_store());
    let mut engine = GameEngine::resume(
        config,
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&store)),
    );

    assert!(store.load().is_none(), "resume alone writes nothing");

    assert!(engine.dispatch(PlayerAction::Start).unwrap());
    assert_eq!(store.load().as_ref(), Some(engine.state()));

    assert!(engine.dispatch(PlayerAction::StartMonth).unwrap());
    assert_eq!(store.load().as_ref(), Some(engine.state()));
}

#[test]
fn rejected_actions_are_not_journaled() {
    let config = GameConfig::builtin();
    let store = Rc::new(build_store());
    let mut engine = GameEngine::resume(
        config,
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&store)),
    );

    assert!(engine.dispatch(PlayerAction::Start).unwrap());
    assert!(!engine.dispatch(PlayerAction::Save { amount: 100.0 }).unwrap());
    assert!(engine.dispatch(PlayerAction::StartMonth).unwrap());
    assert!(!engine.dispatch(PlayerAction::StartMonth).unwrap());

    let entries = store.transitions_for_run(&engine.run_id).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(store.transition_count(&engine.run_id).unwrap(), 2);

    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[0].action, "start");
    assert_eq!(entries[0].phase_before, "intro");
    assert_eq!(entries[0].phase_after, "playing");

    assert_eq!(entries[1].seq, 2);
    assert_eq!(entries[1].action, "start_month");
    assert_eq!(entries[1].phase_after, "event");

    let replayed: PlayerAction = serde_json::from_str(&entries[1].payload).unwrap();
    assert_eq!(replayed, PlayerAction::StartMonth);
}

#[test]
fn resumed_engine_continues_where_it_left_off() {
    let config = GameConfig::builtin();
    let port = Rc::new(MemorySnapshots::new());

    let mut first = GameEngine::resume(
        config.clone(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );
    for action in [PlayerAction::Start, PlayerAction::StartMonth, PlayerAction::ResolveEvent] {
        first.dispatch(action).unwrap();
    }
    let saved = first.state().clone();
    assert_eq!(port.journal().len(), 3);

    let second = GameEngine::resume(
        config,
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );
    assert_eq!(second.state(), &saved);
    assert_eq!(second.state().phase, Phase::Decision);
    assert_ne!(second.run_id, first.run_id);
}

#[test]
fn restart_overwrites_snapshot_with_initial_state() {
    let config = GameConfig::builtin();
    let port = Rc::new(MemorySnapshots::new());
    let mut engine = GameEngine::resume(
        config.clone(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );

    engine.dispatch(PlayerAction::Start).unwrap();
    engine.dispatch(PlayerAction::StartMonth).unwrap();
    engine.dispatch(PlayerAction::Restart).unwrap();

    assert_eq!(port.load(), Some(GameState::initial(&config)));
}

#[test]
fn failed_snapshot_write_leaves_state_unapplied() {
    let config = GameConfig::builtin();
    let port = Rc::new(UnreliablePort::default());
    port.refuse_saves.set(true);
    let mut engine = GameEngine::resume(
        config.clone(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );

    let err = engine.dispatch(PlayerAction::Start).expect_err("save must fail");
    assert!(err.to_string().contains("disk full"), "unexpected error: {err}");
    assert_eq!(engine.state(), &GameState::initial(&config));
    assert!(port.inner.journal().is_empty());
}

#[test]
fn retry_after_failed_write_applies_once() {
    let port = Rc::new(UnreliablePort::default());
    let mut engine = GameEngine::resume(
        GameConfig::builtin(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );
    for action in [PlayerAction::Start, PlayerAction::StartMonth, PlayerAction::ResolveEvent] {
        assert!(engine.dispatch(action).unwrap());
    }
    assert_eq!(engine.state().balance, 4500.0);

    port.refuse_saves.set(true);
    assert!(engine.dispatch(PlayerAction::Save { amount: 2000.0 }).is_err());
    assert_eq!(engine.state().balance, 4500.0);
    assert_eq!(engine.state().savings, 0.0);

    port.refuse_saves.set(false);
    assert!(engine.dispatch(PlayerAction::Save { amount: 2000.0 }).unwrap());
    assert_eq!(engine.state().balance, 2500.0);
    assert_eq!(engine.state().savings, 2000.0);

    let journal = port.inner.journal();
    assert_eq!(journal.len(), 4);
    assert_eq!(journal[3].seq, 4, "failed write must not consume a sequence number");
    assert_eq!(port.load().as_ref(), Some(engine.state()));
}

#[test]
fn failed_journal_append_keeps_transition() {
    let port = Rc::new(UnreliablePort::default());
    port.refuse_journal.set(true);
    let mut engine = GameEngine::resume(
        GameConfig::builtin(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );

    assert!(engine.dispatch(PlayerAction::Start).unwrap());
    assert_eq!(engine.state().phase, Phase::Playing);
    assert_eq!(port.load().as_ref(), Some(engine.state()));
    assert!(port.inner.journal().is_empty());
}

#[test]
fn oversized_loan_does_not_cost_the_saved_run() {
    let config = GameConfig::builtin();
    let port = Rc::new(MemorySnapshots::new());
    let mut engine = GameEngine::resume(
        config.clone(),
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );
    for action in [PlayerAction::Start, PlayerAction::StartMonth, PlayerAction::ResolveEvent] {
        assert!(engine.dispatch(action).unwrap());
    }

    assert!(!engine.dispatch(PlayerAction::TakeLoan { amount: 1.7e308 }).unwrap());
    assert!(engine.state().debt.is_finite());

    let resumed = GameEngine::resume(
        config,
        Box::new(ScriptedRng::constant(7)),
        Box::new(Rc::clone(&port)),
    );
    assert_eq!(resumed.state(), engine.state());
    assert_eq!(resumed.state().phase, Phase::Decision);
}

#[test]
fn infinite_money_is_incoherent() {
    let config = GameConfig::builtin();
    let state = GameState { debt: f64::INFINITY, ..GameState::initial(&config) };
    assert!(!state.is_coherent());
}

#[test]
fn file_backed_store_survives_reopen() {
    let path = std::env::temp_dir().join(format!("krishicash-{}.db", std::process::id()));
    let path_str = path.to_str().expect("utf-8 temp path");
    let state = played_state();
    {
        let store = GameStore::open(path_str).expect("open file store");
        store.migrate().expect("migration");
        store.save(&state).expect("save");
    }

    let reopened = GameStore::open(path_str).expect("reopen file store");
    reopened.migrate().expect("migrations are idempotent");
    assert_eq!(reopened.load(), Some(state));

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}
