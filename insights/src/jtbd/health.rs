use serde::{Deserialize, Serialize};
use shared_types::{JtbdRecord, Priority};

/// Progress above which an unproblematic goal is rated excellent
const EXCELLENT_PROGRESS: f64 = 70.0;
/// More high-priority actions than this rates a customer fair
const FAIR_HIGH_ACTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    NeedsAttention,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerHealth {
    pub customer_id: String,
    pub customer_name: String,
    pub status: HealthStatus,
    pub critical_actions: usize,
    pub high_actions: usize,
    pub progress: f64,
    pub on_track: bool,
}

/// Rules are checked in order and the first match wins:
/// critical action or off-track goal, then more than two high actions, then
/// progress above 70%.
pub fn classify_health(record: &JtbdRecord) -> HealthStatus {
    let critical = count_priority(record, Priority::Critical);
    let high = count_priority(record, Priority::High);

    if critical > 0 || !record.primary_goal.on_track {
        HealthStatus::NeedsAttention
    } else if high > FAIR_HIGH_ACTIONS {
        HealthStatus::Fair
    } else if record.primary_goal.current_progress > EXCELLENT_PROGRESS {
        HealthStatus::Excellent
    } else {
        HealthStatus::Good
    }
}

pub fn customer_health(record: &JtbdRecord) -> CustomerHealth {
    CustomerHealth {
        customer_id: record.customer_id.clone(),
        customer_name: record.customer_name.clone(),
        status: classify_health(record),
        critical_actions: count_priority(record, Priority::Critical),
        high_actions: count_priority(record, Priority::High),
        progress: record.primary_goal.current_progress,
        on_track: record.primary_goal.on_track,
    }
}

fn count_priority(record: &JtbdRecord, priority: Priority) -> usize {
    record
        .actions
        .iter()
        .filter(|a| a.priority == priority)
        .count()
}
