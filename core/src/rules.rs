//! Financial rules engine — pure functions, no state ownership.
//!
//! RULE: Nothing here mutates a GameState or touches storage.
//! Every function takes the figures it needs and returns new figures;
//! the controller in engine.rs decides when each rule applies.
//!
//! Stability policy: a single holistic recompute (compute_stability)
//! after every transition that moves money. There are no per-action
//! stability deltas anywhere in the engine.

use crate::{
    catalog::{EventKind, GameEvent},
    config::{BaseExpenses, EconomyConfig},
    rng::RandomSource,
    state::GameState,
    types::Rupees,
};
use serde::{Deserialize, Serialize};

/// Currency amounts are whole rupees after any scaling.
fn round_rupees(amount: f64) -> Rupees {
    amount.round()
}

// ── Expenses ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expenses {
    pub household: Rupees,
    pub farming:   Rupees,
    pub education: Rupees,
}

impl Expenses {
    pub fn total(&self) -> Rupees {
        self.household + self.farming + self.education
    }
}

/// Fixed monthly expenses, each rounded after scaling by difficulty.
pub fn scaled_expenses(base: &BaseExpenses, multiplier: f64) -> Expenses {
    Expenses {
        household: round_rupees(base.household * multiplier),
        farming:   round_rupees(base.farming * multiplier),
        education: round_rupees(base.education * multiplier),
    }
}

// ── Events ─────────────────────────────────────────────────────

/// Rewards grow slower than costs: 0.8 + 0.2 × multiplier by default.
pub fn reward_scale(economy: &EconomyConfig, multiplier: f64) -> f64 {
    economy.reward_scale_base + economy.reward_scale_slope * multiplier
}

/// Copy of a catalog event with cost and reward scaled for this difficulty.
pub fn scale_event(event: &GameEvent, economy: &EconomyConfig, multiplier: f64) -> GameEvent {
    let reward_factor = reward_scale(economy, multiplier);
    GameEvent {
        cost:   event.cost.map(|c| round_rupees(c * multiplier)),
        reward: event.reward.map(|r| round_rupees(r * reward_factor)),
        ..event.clone()
    }
}

/// Uniform draw over the catalog. None only for an empty catalog.
pub fn draw_event(
    catalog: &[GameEvent],
    economy: &EconomyConfig,
    multiplier: f64,
    rng: &mut dyn RandomSource,
) -> Option<GameEvent> {
    if catalog.is_empty() {
        return None;
    }
    let index = rng.next_index(catalog.len());
    catalog
        .get(index)
        .map(|event| scale_event(event, economy, multiplier))
}

/// What the household actually pays for an event.
/// Insured crop losses are capped at the insurance floor.
pub fn effective_event_cost(
    has_insurance: bool,
    event: &GameEvent,
    economy: &EconomyConfig,
) -> Rupees {
    let cost = event.cost.unwrap_or(0.0).max(0.0);
    if event.kind == EventKind::CropLoss && has_insurance {
        cost.min(economy.crop_loss_insured_floor)
    } else {
        cost
    }
}

pub fn event_reward(event: &GameEvent) -> Rupees {
    event.reward.unwrap_or(0.0).max(0.0)
}

// ── Stability ──────────────────────────────────────────────────

/// The five clamped sub-scores behind the stability score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityBreakdown {
    /// 0–25
    pub balance:     f64,
    /// 0–30
    pub savings:     f64,
    /// 0–25
    pub debt:        f64,
    /// 0 or 10
    pub insurance:   f64,
    /// 0–10
    pub flexibility: f64,
}

impl StabilityBreakdown {
    pub fn total(&self) -> f64 {
        self.balance + self.savings + self.debt + self.insurance + self.flexibility
    }
}

pub fn stability_breakdown(state: &GameState, total_expenses: Rupees) -> StabilityBreakdown {
    // Zero-expense configs would divide by zero; treat as one rupee.
    let expenses = if total_expenses > 0.0 { total_expenses } else { 1.0 };

    let balance_ratio = state.balance / expenses;
    let savings_months = state.savings / expenses;
    let debt_ratio = state.debt / state.monthly_income;
    let flexibility_ratio = state.net_worth() / expenses;

    StabilityBreakdown {
        balance:     (balance_ratio * 12.5 + 12.5).clamp(0.0, 25.0),
        savings:     (savings_months * 10.0).clamp(0.0, 30.0),
        debt:        (25.0 - debt_ratio * 15.0).clamp(0.0, 25.0),
        insurance:   if state.has_insurance { 10.0 } else { 0.0 },
        flexibility: (flexibility_ratio * 5.0 + 5.0).clamp(0.0, 10.0),
    }
}

/// Holistic stability score, rounded and clamped to [0, 100].
pub fn compute_stability(state: &GameState, total_expenses: Rupees) -> f64 {
    let total = stability_breakdown(state, total_expenses).total();
    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, 100.0).round()
}

// ── Credit ─────────────────────────────────────────────────────

/// Monthly EMI: debt / emi_months, deferred when post-expense cash is short.
pub fn amortize_debt(debt: Rupees, balance_after_expenses: Rupees, emi_months: u32) -> Rupees {
    if debt <= 0.0 {
        return 0.0;
    }
    let installment = debt / f64::from(emi_months.max(1));
    installment.min(balance_after_expenses.max(0.0)).min(debt)
}

/// Loan interest inflates with difficulty: 20% + 5% per multiplier point.
pub fn loan_interest_rate(economy: &EconomyConfig, multiplier: f64) -> f64 {
    economy.loan_base_rate + (multiplier - 1.0) * economy.loan_rate_per_difficulty
}

/// (new balance, new debt) after borrowing `amount`.
pub fn apply_loan(state: &GameState, economy: &EconomyConfig, amount: Rupees) -> (Rupees, Rupees) {
    let rate = loan_interest_rate(economy, state.difficulty_multiplier);
    (
        state.balance + amount,
        state.debt + amount + amount * rate,
    )
}

// ── Insurance ──────────────────────────────────────────────────

pub fn scaled_premium(economy: &EconomyConfig, multiplier: f64) -> Rupees {
    round_rupees(economy.insurance_premium * multiplier)
}

// ── Growth and difficulty ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeGrowth {
    pub new_income: Rupees,
    pub raise:      Rupees,
}

/// A sustained saving streak earns a permanent raise.
/// The caller resets both streak counters when this returns Some.
pub fn check_income_growth(state: &GameState, economy: &EconomyConfig) -> Option<IncomeGrowth> {
    if state.consecutive_saving_months < economy.growth_min_streak_months
        || state.total_saved_this_streak < economy.growth_min_streak_savings
    {
        return None;
    }
    let raise = round_rupees(economy.growth_bonus * state.difficulty_multiplier);
    Some(IncomeGrowth {
        new_income: state.monthly_income + raise,
        raise,
    })
}

/// Next year's multiplier, kept at two decimals so repeated steps don't drift.
pub fn bump_difficulty(multiplier: f64, step: f64) -> f64 {
    ((multiplier + step) * 100.0).round() / 100.0
}
