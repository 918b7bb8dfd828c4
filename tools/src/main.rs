//! krishicash-runner: headless driver for the KrishiCash engine.
//!
//! Usage:
//!   krishicash-runner --seed 12345 --years 5 --db game.db
//!   krishicash-runner --db game.db --ipc-mode
//!   krishicash-runner --db game.db --fresh --data-dir ./data

use anyhow::Result;
use krishicash_core::{
    action::PlayerAction,
    config::GameConfig,
    engine::GameEngine,
    outcome,
    rng::GameRng,
    rules::Expenses,
    snapshot::SnapshotPort,
    state::{GameState, Phase},
    store::GameStore,
    types::Rupees,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Cash the autoplay policy keeps on hand before saving or repaying.
const CASH_BUFFER: Rupees = 1000.0;
/// Hard stop for autoplay, far beyond any real run length.
const MAX_STEPS: usize = 100_000;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Action { action: PlayerAction },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    applied:         bool,
    state:           &'a GameState,
    expenses:        Expenses,
    insurance_quote: Rupees,
    loan_quote:      Rupees,
    goal_progress:   f64,
    remaining:       Rupees,
    verdict:         outcome::Verdict,
    lessons:         Vec<outcome::Lesson>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let years = parse_arg(&args, "--years", 5usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let fresh = args.iter().any(|a| a == "--fresh");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let config = GameConfig::load(data_dir)?;

    if !ipc_mode {
        println!("KrishiCash — runner");
        println!("  seed:      {seed}");
        println!("  years:     {years}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = GameStore::open(db)?;
    store.migrate()?;
    if fresh {
        store.clear_snapshot(store.slot())?;
    }
    let store = Rc::new(store);

    let mut engine = GameEngine::resume(
        config,
        Box::new(GameRng::new(seed)),
        Box::new(Rc::clone(&store)),
    );

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        autoplay(&mut engine, years)?;
        print_summary(&engine, &store)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut GameEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                let ui = build_ui_state(engine, false);
                writeln!(stdout, "{}", serde_json::to_string(&ui)?)?;
            }
            IpcCommand::Action { action } => {
                let applied = engine.dispatch(action)?;
                let ui = build_ui_state(engine, applied);
                writeln!(stdout, "{}", serde_json::to_string(&ui)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &GameEngine, applied: bool) -> UiState<'_> {
    let state = engine.state();
    UiState {
        applied,
        state,
        expenses:        engine.expenses(),
        insurance_quote: engine.insurance_quote(),
        loan_quote:      engine.loan_quote(engine.config().economy.loan_amount),
        goal_progress:   outcome::goal_progress(state),
        remaining:       outcome::remaining_to_goal(state),
        verdict:         outcome::verdict(state),
        lessons:         outcome::lessons(state),
    }
}

// ── Autoplay ───────────────────────────────────────────────────

fn autoplay(engine: &mut GameEngine, years: usize) -> Result<()> {
    for _ in 0..MAX_STEPS {
        let Some(action) = next_action(engine, years) else {
            return Ok(());
        };
        if !engine.dispatch(action.clone())? {
            log::warn!("autoplay action {} was rejected; stopping", action.name());
            return Ok(());
        }
    }
    log::warn!("autoplay hit the {MAX_STEPS}-step limit");
    Ok(())
}

/// A prudent household: insure, keep a small buffer, clear debt, save the rest.
fn next_action(engine: &GameEngine, years: usize) -> Option<PlayerAction> {
    let state = engine.state();
    match state.phase {
        Phase::Intro => Some(PlayerAction::Start),
        Phase::GoalSelection => {
            let goal = engine
                .config()
                .goals
                .iter()
                .find(|g| !state.has_completed(&g.id))?;
            Some(PlayerAction::SelectGoal { goal_id: goal.id.clone() })
        }
        Phase::Playing => Some(PlayerAction::StartMonth),
        Phase::Event => Some(PlayerAction::ResolveEvent),
        Phase::Decision => Some(decide(engine)),
        Phase::Summary => Some(PlayerAction::ContinueMonth),
        Phase::YearEnd => {
            if state.year_history.len() + 1 >= years {
                None
            } else {
                Some(PlayerAction::ContinueYear)
            }
        }
        Phase::Ended => None,
    }
}

fn decide(engine: &GameEngine) -> PlayerAction {
    let state = engine.state();
    let economy = &engine.config().economy;

    if !state.has_insurance && state.balance >= engine.insurance_quote() + CASH_BUFFER {
        return PlayerAction::BuyInsurance;
    }
    if state.balance < 0.0 && state.debt <= 0.0 {
        return PlayerAction::TakeLoan { amount: economy.loan_amount };
    }
    if state.debt > 0.0 && state.balance > CASH_BUFFER {
        let amount = (state.balance - CASH_BUFFER).min(state.debt);
        return PlayerAction::RepayLoan { amount };
    }
    let spare = ((state.balance - CASH_BUFFER) / 1000.0).floor() * 1000.0;
    if spare >= 1000.0 {
        return PlayerAction::Save { amount: spare };
    }
    PlayerAction::EndMonth
}

fn print_summary(engine: &GameEngine, store: &GameStore) -> Result<()> {
    let state = engine.state();
    let verdict = outcome::verdict(state);
    let journal = store.transition_count(&engine.run_id)?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", engine.run_id);
    println!("  phase:           {}", state.phase.name());
    println!("  years played:    {}", outcome::years_played(state));
    println!("  year / month:    {} / {}", state.year, state.month);
    println!("  goals completed: {}", state.completed_goals.len());
    println!("  savings:         ₹{:.0}", state.savings);
    println!("  balance:         ₹{:.0}", state.balance);
    println!("  monthly income:  ₹{:.0}", state.monthly_income);
    println!("  debt:            ₹{:.0}", state.debt);
    println!("  stability:       {:.0}", state.stability_score);
    println!("  difficulty:      ×{:.2}", state.difficulty_multiplier);
    println!("  journal entries: {journal}");
    if let Some(saved_at) = store.saved_at(store.slot())? {
        println!("  saved at:        {}", saved_at.to_rfc3339());
    }

    println!();
    println!("=== YEARS ===");
    if state.year_history.is_empty() {
        println!("  (No years completed yet)");
    }
    for y in &state.year_history {
        println!(
            "  Y{} | Savings: ₹{:.0} | Income: ₹{:.0} | Stability: {:.0} | {} {}",
            y.year,
            y.savings,
            y.income,
            y.stability_score,
            if y.goal_met { "met" } else { "missed" },
            y.goal_name
        );
    }

    let setbacks = state
        .month_history
        .iter()
        .filter(|m| m.event.as_ref().is_some_and(|e| e.is_setback()))
        .count();
    println!();
    println!("=== THIS YEAR ===");
    println!("  months recorded: {}", state.month_history.len());
    println!("  setbacks:        {setbacks}");
    if let Some(goal) = &state.current_goal {
        println!(
            "  goal:            {} {} ({:.0}%)",
            goal.icon,
            goal.name,
            outcome::goal_progress(state)
        );
    }

    println!();
    println!("=== {} ===", verdict.title());
    println!("  {}", verdict.description());
    for lesson in outcome::lessons(state) {
        let mark = if lesson.positive { "+" } else { "-" };
        println!("  {mark} {}", lesson.text);
    }

    if store.load().is_none() {
        log::warn!("no snapshot persisted for slot '{}'", store.slot());
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
