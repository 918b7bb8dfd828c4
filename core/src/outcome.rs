//! End-of-run assessment: verdict, lessons and goal progress.
//!
//! Read-only views over a GameState for the end and year-end screens.

use crate::{state::GameState, types::Rupees};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Secure,
    Stable,
    Vulnerable,
}

impl Verdict {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Secure     => "Financially Secure Farmer!",
            Self::Stable     => "Stable but Needs Improvement",
            Self::Vulnerable => "Financially Vulnerable",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Secure => {
                "Excellent! You managed your finances wisely and built a stable future."
            }
            Self::Stable => {
                "You did okay, but there's room to improve your financial habits."
            }
            Self::Vulnerable => {
                "Your finances need attention. Try saving more and avoiding debt."
            }
        }
    }
}

pub fn verdict(state: &GameState) -> Verdict {
    if state.stability_score > 80.0 {
        Verdict::Secure
    } else if state.stability_score > 50.0 {
        Verdict::Stable
    } else {
        Verdict::Vulnerable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub positive: bool,
    pub text:     String,
}

const STRONG_SAVINGS: Rupees = 10_000.0;
const WEAK_SAVINGS: Rupees = 5_000.0;
const GROWN_INCOME: Rupees = 15_000.0;

/// Applicable lessons, in display order.
pub fn lessons(state: &GameState) -> Vec<Lesson> {
    let goals = state.completed_goals.len();
    let candidates = [
        (
            goals >= 3,
            true,
            format!("Amazing! You completed {goals} major goals!"),
        ),
        (
            state.savings >= STRONG_SAVINGS,
            true,
            "Excellent savings! You built a strong financial cushion.".to_string(),
        ),
        (
            state.savings < WEAK_SAVINGS && goals == 0,
            false,
            "Try to save more regularly to build emergency funds.".to_string(),
        ),
        (
            state.monthly_income > GROWN_INCOME,
            true,
            "Your consistent saving unlocked significant income growth!".to_string(),
        ),
        (
            state.debt <= 0.0,
            true,
            "You avoided or paid off debt - excellent discipline!".to_string(),
        ),
        (
            state.debt > 0.0,
            false,
            "High-interest loans hurt your finances. Avoid when possible.".to_string(),
        ),
        (
            state.stability_score >= 80.0,
            true,
            "You maintained excellent financial stability throughout!".to_string(),
        ),
    ];

    candidates
        .into_iter()
        .filter(|(applies, _, _)| *applies)
        .map(|(_, positive, text)| Lesson { positive, text })
        .collect()
}

/// Percent of the current goal saved, capped at 100. 0 with no goal.
pub fn goal_progress(state: &GameState) -> f64 {
    match &state.current_goal {
        Some(goal) if goal.target_amount > 0.0 => {
            (state.savings / goal.target_amount * 100.0).min(100.0)
        }
        _ => 0.0,
    }
}

pub fn remaining_to_goal(state: &GameState) -> Rupees {
    state
        .current_goal
        .as_ref()
        .map_or(0.0, |g| (g.target_amount - state.savings).max(0.0))
}

/// Years played so far, counting the one in progress.
pub fn years_played(state: &GameState) -> usize {
    let closed = state.year_history.len();
    match state.year_history.last() {
        Some(record) if record.year == state.year => closed,
        _ => closed + 1,
    }
}
