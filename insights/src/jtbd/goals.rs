use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use shared_types::{GoalType, JtbdRecord};

/// Goals below this progress that are also off track are at risk
const AT_RISK_PROGRESS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub customer_id: String,
    pub customer_name: String,
    pub goal_type: GoalType,
    pub progress: f64,
    pub on_track: bool,
    pub monthly_required: f64,
    pub months_remaining: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalsOverview {
    pub on_track: usize,
    pub off_track: usize,
    pub average_progress: f64,
    pub at_risk: Vec<GoalProgress>,
}

/// Whole calendar months from `from` to `to`, ignoring the day of month
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

pub fn goal_progress(record: &JtbdRecord, today: NaiveDate) -> GoalProgress {
    let goal = &record.primary_goal;
    GoalProgress {
        customer_id: record.customer_id.clone(),
        customer_name: record.customer_name.clone(),
        goal_type: goal.goal_type,
        progress: goal.current_progress,
        on_track: goal.on_track,
        monthly_required: goal.monthly_required,
        months_remaining: months_between(today, goal.target_date).max(0),
    }
}

pub fn goals_overview(records: &[JtbdRecord], today: NaiveDate) -> GoalsOverview {
    let on_track = records.iter().filter(|r| r.primary_goal.on_track).count();
    let average_progress = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|r| r.primary_goal.current_progress)
            .sum::<f64>()
            / records.len() as f64
    };

    let at_risk = records
        .iter()
        .filter(|r| {
            r.primary_goal.current_progress < AT_RISK_PROGRESS && !r.primary_goal.on_track
        })
        .map(|r| goal_progress(r, today))
        .collect();

    GoalsOverview {
        on_track,
        off_track: records.len() - on_track,
        average_progress,
        at_risk,
    }
}
