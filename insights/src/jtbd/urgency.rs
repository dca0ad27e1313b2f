use chrono::NaiveDate;
use serde::Serialize;
use shared_types::{JtbdAction, JtbdRecord, Priority};

pub const DEFAULT_URGENCY_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgentAction {
    pub customer_id: String,
    pub customer_name: String,
    pub action: JtbdAction,
    /// `None` when the action has no deadline
    pub days_until_deadline: Option<i64>,
}

/// Actions that are critical or high, or due within `threshold_days`
/// (overdue included), most urgent first.
pub fn urgent_actions(records: &[JtbdRecord], today: NaiveDate, threshold_days: i64) -> Vec<UrgentAction> {
    let mut urgent: Vec<UrgentAction> = records
        .iter()
        .flat_map(|record| {
            record.actions.iter().filter_map(move |action| {
                let days_until_deadline = action.deadline.map(|d| (d - today).num_days());
                let pressing = matches!(action.priority, Priority::Critical | Priority::High)
                    || days_until_deadline.is_some_and(|days| days <= threshold_days);

                pressing.then(|| UrgentAction {
                    customer_id: record.customer_id.clone(),
                    customer_name: record.customer_name.clone(),
                    action: action.clone(),
                    days_until_deadline,
                })
            })
        })
        .collect();

    urgent.sort_by_key(|u| {
        (
            u.action.priority.ordinal(),
            u.days_until_deadline.unwrap_or(i64::MAX),
        )
    });
    urgent
}
