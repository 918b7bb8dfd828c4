//! GameState — the single source of truth for a run.
//!
//! RULE: A GameState is never mutated by a transition. Every action
//! produces a new value (see engine.rs); histories are append-only and
//! carried forward by value.

use crate::{
    catalog::{next_goal, GameEvent, Goal},
    config::GameConfig,
    types::{GoalId, Rupees},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    GoalSelection,
    Playing,
    Event,
    Decision,
    Summary,
    YearEnd,
    Ended,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Intro         => "intro",
            Self::GoalSelection => "goal_selection",
            Self::Playing       => "playing",
            Self::Event         => "event",
            Self::Decision      => "decision",
            Self::Summary       => "summary",
            Self::YearEnd       => "year_end",
            Self::Ended         => "ended",
        }
    }
}

/// Month-end snapshot. Cleared when a new year starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub month:    u32,
    pub income:   Rupees,
    pub expenses: Rupees,
    pub savings:  Rupees,
    pub balance:  Rupees,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event:    Option<GameEvent>,
}

/// Year-end snapshot. Kept for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year:            u32,
    pub savings:         Rupees,
    pub income:          Rupees,
    pub stability_score: f64,
    pub goal_met:        bool,
    pub goal_name:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub year:  u32,
    pub month: u32,

    pub balance:         Rupees,
    pub monthly_income:  Rupees,
    pub savings:         Rupees,
    pub stability_score: f64,

    pub has_insurance:     bool,
    pub insurance_premium: Rupees,
    pub debt:              Rupees,

    pub consecutive_saving_months: u32,
    pub total_saved_this_streak:   Rupees,

    pub current_goal:    Option<Goal>,
    /// Insertion order is completion order.
    pub completed_goals: Vec<GoalId>,

    pub difficulty_multiplier: f64,
    pub phase:                 Phase,
    pub current_event:         Option<GameEvent>,

    pub month_history: Vec<MonthRecord>,
    pub year_history:  Vec<YearRecord>,
}

impl GameState {
    /// Fresh run: year 1, month 1, first catalog goal, phase Intro.
    pub fn initial(config: &GameConfig) -> Self {
        let economy = &config.economy;
        Self {
            year:  1,
            month: 1,
            balance:         economy.starting_balance,
            monthly_income:  economy.starting_income,
            savings:         0.0,
            stability_score: economy.starting_stability,
            has_insurance:     false,
            insurance_premium: 0.0,
            debt:              0.0,
            consecutive_saving_months: 0,
            total_saved_this_streak:   0.0,
            current_goal:    next_goal(&config.goals, &[]).cloned(),
            completed_goals: Vec::new(),
            difficulty_multiplier: 1.0,
            phase:                 Phase::Intro,
            current_event:         None,
            month_history: Vec::new(),
            year_history:  Vec::new(),
        }
    }

    pub fn is_goal_met(&self) -> bool {
        self.current_goal
            .as_ref()
            .is_some_and(|g| self.savings >= g.target_amount)
    }

    pub fn has_completed(&self, goal_id: &str) -> bool {
        self.completed_goals.iter().any(|id| id == goal_id)
    }

    /// Balance + savings − debt.
    pub fn net_worth(&self) -> Rupees {
        self.balance + self.savings - self.debt
    }

    /// Shape checks for a snapshot read back from storage.
    /// A state failing these is treated as incompatible and discarded.
    pub fn is_coherent(&self) -> bool {
        self.year >= 1
            && (1..=crate::types::MONTHS_PER_YEAR).contains(&self.month)
            && self.monthly_income > 0.0
            && self.balance.is_finite()
            && self.savings >= 0.0
            && self.savings.is_finite()
            && self.debt >= 0.0
            && self.debt.is_finite()
            && (0.0..=100.0).contains(&self.stability_score)
            && self.difficulty_multiplier >= 1.0
            && (self.current_goal.is_some() || self.phase == Phase::Ended)
    }
}
