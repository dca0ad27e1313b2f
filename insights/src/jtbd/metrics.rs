use chrono::NaiveDate;
use serde::Serialize;
use shared_types::{JtbdRecord, Priority};

/// Window, in days from today, for the upcoming-deadline count
pub const UPCOMING_DEADLINE_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JtbdMetrics {
    pub total_actions: usize,
    pub critical_actions: usize,
    /// Critical or high
    pub high_priority_actions: usize,
    pub upcoming_deadlines: usize,
    pub total_estimated_value: f64,
    pub goals_on_track: usize,
    pub goals_off_track: usize,
    pub average_progress: f64,
}

pub fn compute_metrics(records: &[JtbdRecord], today: NaiveDate) -> JtbdMetrics {
    let mut metrics = JtbdMetrics::default();

    for record in records {
        for action in &record.actions {
            metrics.total_actions += 1;
            if action.priority == Priority::Critical {
                metrics.critical_actions += 1;
            }
            if matches!(action.priority, Priority::Critical | Priority::High) {
                metrics.high_priority_actions += 1;
            }
            if let Some(deadline) = action.deadline {
                let days = (deadline - today).num_days();
                if (0..=UPCOMING_DEADLINE_DAYS).contains(&days) {
                    metrics.upcoming_deadlines += 1;
                }
            }
            metrics.total_estimated_value += action.estimated_value.unwrap_or(0.0);
        }

        if record.primary_goal.on_track {
            metrics.goals_on_track += 1;
        } else {
            metrics.goals_off_track += 1;
        }
    }

    if !records.is_empty() {
        let progress: f64 = records
            .iter()
            .map(|r| r.primary_goal.current_progress)
            .sum();
        metrics.average_progress = progress / records.len() as f64;
    }

    metrics
}
