//! Saving goals and monthly financial events.
//!
//! RULE: Catalog entries are immutable. A drawn event is a scaled
//! copy of its catalog entry; the catalog itself is never touched.

use crate::types::{EventId, GoalId, Rupees};
use serde::{Deserialize, Serialize};

/// A yearly saving goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id:            GoalId,
    pub name:          String,
    pub target_amount: Rupees,
    pub icon:          String,
    pub description:   String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Medical,
    CropLoss,
    GoodRain,
    LoanOffer,
    Festival,
    Equipment,
    Bonus,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Medical   => "medical",
            Self::CropLoss  => "crop_loss",
            Self::GoodRain  => "good_rain",
            Self::LoanOffer => "loan_offer",
            Self::Festival  => "festival",
            Self::Equipment => "equipment",
            Self::Bonus     => "bonus",
        }
    }
}

/// A random financial event that may strike the household in a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id:          EventId,
    pub kind:        EventKind,
    pub title:       String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost:        Option<Rupees>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward:      Option<Rupees>,
    /// Quoted interest rate in percent (loan offers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest:    Option<f64>,
}

impl GameEvent {
    pub fn is_setback(&self) -> bool {
        self.cost.is_some_and(|c| c > 0.0)
    }
}

/// First catalog goal whose id is not in `completed`.
pub fn next_goal<'a>(catalog: &'a [Goal], completed: &[GoalId]) -> Option<&'a Goal> {
    catalog.iter().find(|g| !completed.contains(&g.id))
}

pub fn find_goal<'a>(catalog: &'a [Goal], id: &str) -> Option<&'a Goal> {
    catalog.iter().find(|g| g.id == id)
}
