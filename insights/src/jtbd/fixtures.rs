use chrono::NaiveDate;
use shared_types::{ActionType, GoalType, JtbdAction, JtbdRecord, PrimaryGoal, Priority};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn action(id: &str, priority: Priority, deadline: Option<NaiveDate>, value: Option<f64>) -> JtbdAction {
    JtbdAction {
        id: id.to_string(),
        title: format!("action {id}"),
        priority,
        action_type: ActionType::FollowUp,
        deadline,
        estimated_value: value,
    }
}

pub fn record(customer_id: &str, progress: f64, on_track: bool, actions: Vec<JtbdAction>) -> JtbdRecord {
    JtbdRecord {
        customer_id: customer_id.to_string(),
        customer_name: format!("Customer {customer_id}"),
        primary_goal: PrimaryGoal {
            goal_type: GoalType::Retirement,
            description: "Retire at 55".to_string(),
            target_amount: 10_000_000.0,
            current_progress: progress,
            target_date: date(2030, 3, 31),
            on_track,
            monthly_required: 25_000.0,
        },
        actions,
    }
}
