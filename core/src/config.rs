//! Game configuration — economy constants and the goal/event catalogs.
//!
//! Loaded from the data/ directory at startup:
//!   data/rules/economy.json
//!   data/goals/saving_goals.json
//!   data/events/event_catalog.json
//!
//! In tests, use GameConfig::builtin(), which carries the same values.

use crate::{
    catalog::{EventKind, GameEvent, Goal},
    types::Rupees,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseExpenses {
    pub household: Rupees,
    pub farming:   Rupees,
    pub education: Rupees,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub base_expenses: BaseExpenses,

    // ── Starting household ─────────────────────────
    pub starting_income:    Rupees,
    pub starting_balance:   Rupees,
    pub starting_stability: f64,

    // ── Insurance ──────────────────────────────────
    pub insurance_premium:        Rupees,
    /// Most an insured household pays for a crop-loss event.
    pub crop_loss_insured_floor:  Rupees,
    /// false = cover lapses at every month end.
    pub insurance_persists:       bool,

    // ── Credit ─────────────────────────────────────
    pub loan_amount:              Rupees,
    pub loan_base_rate:           f64,
    pub loan_rate_per_difficulty: f64,
    pub emi_months:               u32,
    pub allow_stacked_loans:      bool,

    // ── Income growth ──────────────────────────────
    pub growth_min_streak_months:  u32,
    pub growth_min_streak_savings: Rupees,
    pub growth_bonus:              Rupees,

    // ── Difficulty ─────────────────────────────────
    pub difficulty_step:    f64,
    pub reward_scale_base:  f64,
    pub reward_scale_slope: f64,

    /// Route Intro → GoalSelection instead of auto-assigning the first goal.
    pub choose_goal: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_expenses: BaseExpenses {
                household: 3000.0,
                farming:   2500.0,
                education: 1000.0,
            },
            starting_income:           12000.0,
            starting_balance:          0.0,
            starting_stability:        70.0,
            insurance_premium:         500.0,
            crop_loss_insured_floor:   500.0,
            insurance_persists:        true,
            loan_amount:               5000.0,
            loan_base_rate:            0.20,
            loan_rate_per_difficulty:  0.05,
            emi_months:                6,
            allow_stacked_loans:       false,
            growth_min_streak_months:  3,
            growth_min_streak_savings: 6000.0,
            growth_bonus:              1500.0,
            difficulty_step:           0.15,
            reward_scale_base:         0.8,
            reward_scale_slope:        0.2,
            choose_goal:               false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GoalCatalogFile {
    goals: Vec<Goal>,
}

#[derive(Debug, Clone, Deserialize)]
struct EventCatalogFile {
    events: Vec<GameEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub economy: EconomyConfig,
    pub goals:   Vec<Goal>,
    pub events:  Vec<GameEvent>,
}

impl GameConfig {
    /// Load from the data/ directory.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let economy_path = format!("{data_dir}/rules/economy.json");
        let economy_content = std::fs::read_to_string(&economy_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {economy_path}: {e}"))?;
        let economy: EconomyConfig = serde_json::from_str(&economy_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {economy_path}: {e}"))?;

        let goals_path = format!("{data_dir}/goals/saving_goals.json");
        let goals_content = std::fs::read_to_string(&goals_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {goals_path}: {e}"))?;
        let goal_file: GoalCatalogFile = serde_json::from_str(&goals_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {goals_path}: {e}"))?;

        let events_path = format!("{data_dir}/events/event_catalog.json");
        let events_content = std::fs::read_to_string(&events_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {events_path}: {e}"))?;
        let event_file: EventCatalogFile = serde_json::from_str(&events_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {events_path}: {e}"))?;

        let config = Self {
            economy,
            goals:  goal_file.goals,
            events: event_file.events,
        };
        config.validate()?;
        log::debug!(
            "config loaded from {data_dir}: {} goals, {} events",
            config.goals.len(),
            config.events.len()
        );
        Ok(config)
    }

    /// Reject catalogs the engine cannot run on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.goals.is_empty() {
            anyhow::bail!("goal catalog is empty");
        }
        if self.events.is_empty() {
            anyhow::bail!("event catalog is empty");
        }
        let mut seen = HashSet::new();
        for goal in &self.goals {
            if !seen.insert(goal.id.as_str()) {
                anyhow::bail!("duplicate goal id '{}'", goal.id);
            }
            if goal.target_amount <= 0.0 {
                anyhow::bail!("goal '{}' has non-positive target", goal.id);
            }
        }
        let mut seen = HashSet::new();
        for event in &self.events {
            if !seen.insert(event.id.as_str()) {
                anyhow::bail!("duplicate event id '{}'", event.id);
            }
        }
        if self.economy.emi_months == 0 {
            anyhow::bail!("emi_months must be at least 1");
        }
        if self.economy.starting_income <= 0.0 {
            anyhow::bail!("starting_income must be positive");
        }
        Ok(())
    }

    /// Hardcoded catalogs matching data/, for unit tests and embedding.
    pub fn builtin() -> Self {
        Self {
            economy: EconomyConfig::default(),
            goals:   builtin_goals(),
            events:  builtin_events(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

fn goal(id: &str, name: &str, target: Rupees, icon: &str, description: &str) -> Goal {
    Goal {
        id:            id.into(),
        name:          name.into(),
        target_amount: target,
        icon:          icon.into(),
        description:   description.into(),
    }
}

fn builtin_goals() -> Vec<Goal> {
    vec![
        goal("emergency_fund", "Emergency Fund", 10000.0, "🛡️",
             "Set aside a cushion for bad months"),
        goal("irrigation_pump", "Irrigation Pump", 20000.0, "💧",
             "Stop depending on the rains"),
        goal("education_fund", "Children's Education", 30000.0, "📚",
             "Pay next year's school and college fees up front"),
        goal("tractor", "Tractor Down Payment", 45000.0, "🚜",
             "Own the machine instead of renting it"),
        goal("pucca_house", "Pucca House", 60000.0, "🏠",
             "Replace the mud walls with brick"),
    ]
}

fn event(
    id: &str,
    kind: EventKind,
    title: &str,
    description: &str,
    cost: Option<Rupees>,
    reward: Option<Rupees>,
) -> GameEvent {
    GameEvent {
        id:          id.into(),
        kind,
        title:       title.into(),
        description: description.into(),
        cost,
        reward,
        interest:    None,
    }
}

fn builtin_events() -> Vec<GameEvent> {
    use EventKind::*;
    vec![
        event("medical_1", Medical, "Medical Emergency",
              "A family member fell sick and needs immediate treatment.",
              Some(2000.0), None),
        event("medical_2", Medical, "Hospital Visit",
              "Your child needs medical attention and medicines.",
              Some(1500.0), None),
        event("crop_loss_1", CropLoss, "Pest Attack",
              "Pests damaged a portion of your crops.",
              Some(3000.0), None),
        event("crop_loss_2", CropLoss, "Drought Impact",
              "Lack of rain affected your harvest yield.",
              Some(2500.0), None),
        event("good_rain_1", GoodRain, "Excellent Harvest",
              "Good rainfall blessed your fields with a bumper crop!",
              None, Some(2500.0)),
        event("good_rain_2", GoodRain, "Premium Crop Sale",
              "Your high-quality produce fetched excellent prices at the market.",
              None, Some(3000.0)),
        event("festival_1", Festival, "Festival Season",
              "It's festival time! Family expects gifts and celebrations.",
              Some(1500.0), None),
        event("equipment_1", Equipment, "Tool Repair",
              "Your farming equipment needs urgent repair.",
              Some(1000.0), None),
        event("bonus_1", Bonus, "Government Subsidy",
              "You received a farming subsidy from the government.",
              None, Some(2000.0)),
        GameEvent {
            interest: Some(20.0),
            ..event("loan_offer_1", LoanOffer, "Quick Loan Offer",
                    "An agent offers you a quick loan of ₹5000 at 20% interest.",
                    None, None)
        },
    ]
}
