//! Goal-tracking (jobs-to-be-done) derivations.
//!
//! Every function takes the records it works on plus, where dates matter, the
//! current day. Nothing reads the clock itself.

mod filter;
mod goals;
mod health;
mod metrics;
mod sort;
mod urgency;

#[cfg(test)]
pub(crate) mod fixtures;

pub use filter::{filter_records, JtbdFilters};
pub use goals::{goal_progress, goals_overview, months_between, GoalProgress, GoalsOverview};
pub use health::{classify_health, customer_health, CustomerHealth, HealthStatus};
pub use metrics::{compute_metrics, JtbdMetrics, UPCOMING_DEADLINE_DAYS};
pub use sort::{sort_records, JtbdSort, SortDirection, SortField};
pub use urgency::{urgent_actions, UrgentAction, DEFAULT_URGENCY_DAYS};

use chrono::NaiveDate;
use shared_types::JtbdRecord;

/// Lowest priority ordinal among a record's actions, or one past `low` when
/// there are none
pub(crate) fn min_priority_ordinal(record: &JtbdRecord) -> u8 {
    record
        .actions
        .iter()
        .map(|a| a.priority.ordinal())
        .min()
        .unwrap_or(4)
}

pub(crate) fn earliest_deadline(record: &JtbdRecord) -> Option<NaiveDate> {
    record.actions.iter().filter_map(|a| a.deadline).min()
}

pub(crate) fn total_estimated_value(record: &JtbdRecord) -> f64 {
    record
        .actions
        .iter()
        .map(|a| a.estimated_value.unwrap_or(0.0))
        .sum()
}
