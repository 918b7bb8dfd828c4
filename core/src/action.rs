use crate::{
    state::Phase,
    types::{GoalId, Rupees},
};
use serde::{Deserialize, Serialize};

/// All player-issued actions.
/// Each action is valid in exactly one phase (Restart: any phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    // ── Run lifecycle ─────────────────────────────
    Start,
    SelectGoal { goal_id: GoalId },
    Restart,

    // ── Month loop ────────────────────────────────
    StartMonth,
    ResolveEvent,
    EndMonth,
    ContinueMonth,
    ContinueYear,

    // ── Decisions ─────────────────────────────────
    Save { amount: Rupees },
    BuyInsurance,
    UpdateInsurance { premium: Rupees },
    StopInsurance,
    TakeLoan { amount: Rupees },
    RepayLoan { amount: Rupees },
}

impl PlayerAction {
    /// The phase in which this action is defined. None = every phase.
    pub fn valid_phase(&self) -> Option<Phase> {
        match self {
            Self::Start                   => Some(Phase::Intro),
            Self::SelectGoal { .. }       => Some(Phase::GoalSelection),
            Self::Restart                 => None,
            Self::StartMonth              => Some(Phase::Playing),
            Self::ResolveEvent            => Some(Phase::Event),
            Self::EndMonth
            | Self::Save { .. }
            | Self::BuyInsurance
            | Self::UpdateInsurance { .. }
            | Self::StopInsurance
            | Self::TakeLoan { .. }
            | Self::RepayLoan { .. }      => Some(Phase::Decision),
            Self::ContinueMonth           => Some(Phase::Summary),
            Self::ContinueYear            => Some(Phase::YearEnd),
        }
    }

    /// Stable name for the journal's action column.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start                 => "start",
            Self::SelectGoal { .. }     => "select_goal",
            Self::Restart               => "restart",
            Self::StartMonth            => "start_month",
            Self::ResolveEvent          => "resolve_event",
            Self::EndMonth              => "end_month",
            Self::ContinueMonth         => "continue_month",
            Self::ContinueYear          => "continue_year",
            Self::Save { .. }           => "save",
            Self::BuyInsurance          => "buy_insurance",
            Self::UpdateInsurance { .. } => "update_insurance",
            Self::StopInsurance         => "stop_insurance",
            Self::TakeLoan { .. }       => "take_loan",
            Self::RepayLoan { .. }      => "repay_loan",
        }
    }
}
