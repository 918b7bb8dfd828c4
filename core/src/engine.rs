//! The phase controller — the heart of KrishiCash.
//!
//! PHASE ORDER (one month):
//!   Playing --start_month--> Event --resolve_event--> Decision
//!   Decision --end_month--> Summary --continue_month--> Playing
//!   Decision --end_month (after month 12)--> YearEnd
//!   YearEnd --continue_year--> Playing | Ended
//!
//! RULES:
//!   - Each action is valid in exactly one phase; Restart in any phase.
//!   - An action outside its phase, or with a failed precondition, is a
//!     no-op: the state is returned unchanged and nothing is persisted.
//!   - transition() is pure. GameEngine adds the side effects:
//!     persist the new state, then journal the action.
//!   - All randomness flows through the injected RandomSource.

use crate::{
    action::PlayerAction,
    catalog::{find_goal, next_goal},
    config::GameConfig,
    error::GameResult,
    journal::JournalEntry,
    rng::{GameRng, RandomSource},
    rules::{self, Expenses},
    snapshot::SnapshotPort,
    state::{GameState, MonthRecord, Phase, YearRecord},
    types::{RunId, Rupees, MONTHS_PER_YEAR},
};

/// Apply `action` to `state`. Returns a clone of `state` for a no-op.
pub fn transition(
    state: &GameState,
    action: &PlayerAction,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> GameState {
    apply(state, action, config, rng).unwrap_or_else(|| state.clone())
}

/// Apply `action` to `state`. None when the action is rejected.
pub fn apply(
    state: &GameState,
    action: &PlayerAction,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> Option<GameState> {
    if let Some(phase) = action.valid_phase() {
        if state.phase != phase {
            log::debug!(
                "rejected {}: phase is {}, needs {}",
                action.name(),
                state.phase.name(),
                phase.name()
            );
            return None;
        }
    }

    let next = match action {
        PlayerAction::Start                       => start(state, config),
        PlayerAction::SelectGoal { goal_id }      => select_goal(state, config, goal_id),
        PlayerAction::Restart                     => Some(GameState::initial(config)),
        PlayerAction::StartMonth                  => start_month(state, config, rng),
        PlayerAction::ResolveEvent                => resolve_event(state, config),
        PlayerAction::Save { amount }             => save(state, config, *amount),
        PlayerAction::BuyInsurance                => buy_insurance(state, config),
        PlayerAction::UpdateInsurance { premium } => update_insurance(state, config, *premium),
        PlayerAction::StopInsurance               => stop_insurance(state, config),
        PlayerAction::TakeLoan { amount }         => take_loan(state, config, *amount),
        PlayerAction::RepayLoan { amount }        => repay_loan(state, config, *amount),
        PlayerAction::EndMonth                    => end_month(state, config),
        PlayerAction::ContinueMonth               => continue_month(state),
        PlayerAction::ContinueYear                => continue_year(state, config),
    };

    if next.is_none() {
        log::debug!("rejected {}: precondition failed", action.name());
    }
    next
}

pub fn expenses_for(state: &GameState, config: &GameConfig) -> Expenses {
    rules::scaled_expenses(&config.economy.base_expenses, state.difficulty_multiplier)
}

/// Recompute the stability score against the state's own difficulty.
fn restabilize(mut next: GameState, config: &GameConfig) -> GameState {
    let total = expenses_for(&next, config).total();
    next.stability_score = rules::compute_stability(&next, total);
    next
}

fn is_positive_amount(amount: Rupees) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Money fields must stay representable in a JSON snapshot.
fn has_finite_money(state: &GameState) -> bool {
    state.balance.is_finite()
        && state.savings.is_finite()
        && state.debt.is_finite()
        && state.total_saved_this_streak.is_finite()
}

// ── Run lifecycle ──────────────────────────────────────────────

fn start(state: &GameState, config: &GameConfig) -> Option<GameState> {
    let mut next = state.clone();
    next.phase = if config.economy.choose_goal {
        Phase::GoalSelection
    } else {
        Phase::Playing
    };
    Some(next)
}

fn select_goal(state: &GameState, config: &GameConfig, goal_id: &str) -> Option<GameState> {
    if state.has_completed(goal_id) {
        return None;
    }
    let goal = find_goal(&config.goals, goal_id)?;
    let mut next = state.clone();
    next.current_goal = Some(goal.clone());
    next.phase = Phase::Playing;
    Some(next)
}

// ── Month loop ─────────────────────────────────────────────────

fn start_month(
    state: &GameState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> Option<GameState> {
    let economy = &config.economy;
    let expenses = expenses_for(state, config).total();

    let mut balance = state.balance + state.monthly_income - expenses;
    if state.has_insurance && state.insurance_premium > 0.0 {
        balance -= state.insurance_premium;
    }

    let payment = rules::amortize_debt(state.debt, balance, economy.emi_months);
    let event = rules::draw_event(&config.events, economy, state.difficulty_multiplier, rng);

    log::debug!(
        "year={} month={} start: expenses={expenses} emi={payment:.2} event={}",
        state.year,
        state.month,
        event.as_ref().map_or("none", |e| e.id.as_str())
    );

    let mut next = state.clone();
    next.balance = balance - payment;
    next.debt = (state.debt - payment).max(0.0);
    next.current_event = event;
    next.phase = Phase::Event;
    Some(restabilize(next, config))
}

fn resolve_event(state: &GameState, config: &GameConfig) -> Option<GameState> {
    let mut next = state.clone();
    if let Some(event) = &state.current_event {
        let cost = rules::effective_event_cost(state.has_insurance, event, &config.economy);
        let reward = rules::event_reward(event);
        next.balance = state.balance - cost + reward;
    }
    next.phase = Phase::Decision;
    Some(restabilize(next, config))
}

fn end_month(state: &GameState, config: &GameConfig) -> Option<GameState> {
    let economy = &config.economy;
    let record = MonthRecord {
        month:    state.month,
        income:   state.monthly_income,
        expenses: expenses_for(state, config).total(),
        savings:  state.savings,
        balance:  state.balance,
        event:    state.current_event.clone(),
    };

    let mut next = state.clone();
    next.month_history.push(record);
    next.current_event = None;

    if let Some(growth) = rules::check_income_growth(state, economy) {
        log::info!(
            "year={} month={} income grows by {} to {}",
            state.year,
            state.month,
            growth.raise,
            growth.new_income
        );
        next.monthly_income = growth.new_income;
        next.consecutive_saving_months = 0;
        next.total_saved_this_streak = 0.0;
    }

    let new_month = state.month + 1;
    if new_month > MONTHS_PER_YEAR {
        next.month = MONTHS_PER_YEAR;
        next.phase = if next.current_goal.is_some() {
            Phase::YearEnd
        } else {
            Phase::Ended
        };
    } else {
        next.month = new_month;
        next.phase = Phase::Summary;
        if !economy.insurance_persists {
            next.has_insurance = false;
            next.insurance_premium = 0.0;
        }
    }
    Some(restabilize(next, config))
}

fn continue_month(state: &GameState) -> Option<GameState> {
    let mut next = state.clone();
    next.phase = Phase::Playing;
    Some(next)
}

fn continue_year(state: &GameState, config: &GameConfig) -> Option<GameState> {
    let goal_met = state.is_goal_met();
    let mut next = state.clone();

    next.year_history.push(YearRecord {
        year:            state.year,
        savings:         state.savings,
        income:          state.monthly_income,
        stability_score: state.stability_score,
        goal_met,
        goal_name:       state.current_goal.as_ref().map(|g| g.name.clone()).unwrap_or_default(),
    });

    if let (true, Some(goal)) = (goal_met, &state.current_goal) {
        next.completed_goals.push(goal.id.clone());
        next.savings = (state.savings - goal.target_amount).max(0.0);
    }

    match next_goal(&config.goals, &next.completed_goals) {
        None => {
            log::info!(
                "run ended after year {}: {} goals completed",
                state.year,
                next.completed_goals.len()
            );
            next.current_goal = None;
            next.phase = Phase::Ended;
        }
        Some(goal) => {
            next.year = state.year + 1;
            next.month = 1;
            next.difficulty_multiplier =
                rules::bump_difficulty(state.difficulty_multiplier, config.economy.difficulty_step);
            next.current_goal = Some(goal.clone());
            next.has_insurance = false;
            next.insurance_premium = 0.0;
            next.consecutive_saving_months = 0;
            next.total_saved_this_streak = 0.0;
            next.month_history = Vec::new();
            next.current_event = None;
            next.phase = Phase::Playing;
            log::info!(
                "year {} begins: goal={} difficulty={:.2} debt carried={:.2}",
                next.year,
                goal.id,
                next.difficulty_multiplier,
                next.debt
            );
        }
    }
    Some(restabilize(next, config))
}

// ── Decisions ──────────────────────────────────────────────────

fn save(state: &GameState, config: &GameConfig, amount: Rupees) -> Option<GameState> {
    if !is_positive_amount(amount) || amount > state.balance {
        return None;
    }
    let mut next = state.clone();
    next.balance = state.balance - amount;
    next.savings = state.savings + amount;
    next.total_saved_this_streak = state.total_saved_this_streak + amount;
    next.consecutive_saving_months = state.consecutive_saving_months + 1;
    if !has_finite_money(&next) {
        return None;
    }
    Some(restabilize(next, config))
}

fn buy_insurance(state: &GameState, config: &GameConfig) -> Option<GameState> {
    let premium = rules::scaled_premium(&config.economy, state.difficulty_multiplier);
    if state.has_insurance || state.balance < premium {
        return None;
    }
    let mut next = state.clone();
    next.balance = state.balance - premium;
    next.has_insurance = true;
    next.insurance_premium = premium;
    Some(restabilize(next, config))
}

fn update_insurance(state: &GameState, config: &GameConfig, premium: Rupees) -> Option<GameState> {
    if !state.has_insurance || !is_positive_amount(premium) {
        return None;
    }
    let mut next = state.clone();
    next.insurance_premium = premium;
    Some(restabilize(next, config))
}

fn stop_insurance(state: &GameState, config: &GameConfig) -> Option<GameState> {
    if !state.has_insurance {
        return None;
    }
    let mut next = state.clone();
    next.has_insurance = false;
    next.insurance_premium = 0.0;
    Some(restabilize(next, config))
}

fn take_loan(state: &GameState, config: &GameConfig, amount: Rupees) -> Option<GameState> {
    if !is_positive_amount(amount) {
        return None;
    }
    if state.debt > 0.0 && !config.economy.allow_stacked_loans {
        return None;
    }
    let (balance, debt) = rules::apply_loan(state, &config.economy, amount);
    let mut next = state.clone();
    next.balance = balance;
    next.debt = debt;
    if !has_finite_money(&next) {
        return None;
    }
    Some(restabilize(next, config))
}

fn repay_loan(state: &GameState, config: &GameConfig, amount: Rupees) -> Option<GameState> {
    if !is_positive_amount(amount) || amount > state.balance || state.debt <= 0.0 {
        return None;
    }
    let repayment = amount.min(state.debt);
    let mut next = state.clone();
    next.balance = state.balance - repayment;
    next.debt = (state.debt - repayment).max(0.0);
    if !has_finite_money(&next) {
        return None;
    }
    Some(restabilize(next, config))
}

// ── Controller ─────────────────────────────────────────────────

/// Owns the live state, the random source and the persistence port.
/// The presentation layer reads state() and calls dispatch().
pub struct GameEngine {
    pub run_id: RunId,
    config:     GameConfig,
    rng:        Box<dyn RandomSource>,
    state:      GameState,
    port:       Option<Box<dyn SnapshotPort>>,
    seq:        u64,
}

impl GameEngine {
    /// Fresh run with no persistence.
    pub fn new(config: GameConfig, rng: Box<dyn RandomSource>) -> Self {
        let state = GameState::initial(&config);
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            rng,
            state,
            port: None,
            seq: 0,
        }
    }

    /// Fresh run driven by a seeded RNG.
    pub fn seeded(config: GameConfig, seed: u64) -> Self {
        Self::new(config, Box::new(GameRng::new(seed)))
    }

    /// Resume from the port's snapshot, or start fresh when it has none.
    pub fn resume(
        config: GameConfig,
        rng: Box<dyn RandomSource>,
        port: Box<dyn SnapshotPort>,
    ) -> Self {
        let mut engine = Self::new(config, rng);
        match port.load() {
            Some(state) => {
                log::info!(
                    "resumed snapshot: year={} month={} phase={}",
                    state.year,
                    state.month,
                    state.phase.name()
                );
                engine.state = state;
            }
            None => log::debug!("no usable snapshot, starting fresh"),
        }
        engine.port = Some(port);
        engine
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Apply one action. Ok(false) means the action was a no-op.
    ///
    /// The new state is committed only once the snapshot write succeeds,
    /// so an Err leaves the live state untouched. A failed journal append
    /// is logged and does not undo the transition.
    pub fn dispatch(&mut self, action: PlayerAction) -> GameResult<bool> {
        let Some(next) = apply(&self.state, &action, &self.config, self.rng.as_mut()) else {
            return Ok(false);
        };
        let phase_before = self.state.phase;
        let seq = self.seq + 1;

        if let Some(port) = &self.port {
            port.save(&next)?;
            let entry = JournalEntry {
                id:           None,
                run_id:       self.run_id.clone(),
                seq,
                action:       action.name().to_string(),
                phase_before: phase_before.name().to_string(),
                phase_after:  next.phase.name().to_string(),
                payload:      serde_json::to_string(&action)?,
                recorded_at:  chrono::Utc::now().to_rfc3339(),
            };
            if let Err(e) = port.record_transition(&entry) {
                log::warn!("journal append failed for seq {seq}: {e}");
            }
        }

        self.state = next;
        self.seq = seq;
        log::debug!(
            "applied {}: {} -> {}",
            action.name(),
            phase_before.name(),
            self.state.phase.name()
        );
        Ok(true)
    }

    // ── Quotes for the presentation layer ─────────────────────

    pub fn expenses(&self) -> Expenses {
        expenses_for(&self.state, &self.config)
    }

    /// Premium buy_insurance would charge right now.
    pub fn insurance_quote(&self) -> Rupees {
        rules::scaled_premium(&self.config.economy, self.state.difficulty_multiplier)
    }

    /// Total that would be owed for borrowing `amount` right now.
    pub fn loan_quote(&self, amount: Rupees) -> Rupees {
        amount * (1.0 + rules::loan_interest_rate(&self.config.economy, self.state.difficulty_multiplier))
    }
}
