use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseVariantError;

/// Action priority. Declaration order is the urgency rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// critical=0 < high=1 < medium=2 < low=3
    pub fn ordinal(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ParseVariantError::new("priority", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SipIncrease,
    Rebalance,
    InsuranceReview,
    TaxPlanning,
    DocumentUpdate,
    FollowUp,
}

impl FromStr for ActionType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sip_increase" => Ok(ActionType::SipIncrease),
            "rebalance" => Ok(ActionType::Rebalance),
            "insurance_review" => Ok(ActionType::InsuranceReview),
            "tax_planning" => Ok(ActionType::TaxPlanning),
            "document_update" => Ok(ActionType::DocumentUpdate),
            "follow_up" => Ok(ActionType::FollowUp),
            _ => Err(ParseVariantError::new("action type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Retirement,
    ChildEducation,
    HomePurchase,
    WealthCreation,
    EmergencyFund,
}

impl FromStr for GoalType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "retirement" => Ok(GoalType::Retirement),
            "child_education" => Ok(GoalType::ChildEducation),
            "home_purchase" => Ok(GoalType::HomePurchase),
            "wealth_creation" => Ok(GoalType::WealthCreation),
            "emergency_fund" => Ok(GoalType::EmergencyFund),
            _ => Err(ParseVariantError::new("goal type", s)),
        }
    }
}

/// The single goal a customer is tracked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryGoal {
    pub goal_type: GoalType,
    pub description: String,
    pub target_amount: f64,
    /// Percentage in 0..=100
    pub current_progress: f64,
    pub target_date: NaiveDate,
    pub on_track: bool,
    pub monthly_required: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JtbdAction {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub action_type: ActionType,
    pub deadline: Option<NaiveDate>,
    pub estimated_value: Option<f64>,
}

/// Goal-tracking record of one customer. Actions are kept in priority order
/// as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JtbdRecord {
    pub customer_id: String,
    pub customer_name: String,
    pub primary_goal: PrimaryGoal,
    pub actions: Vec<JtbdAction>,
}
