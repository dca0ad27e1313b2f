use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{ActionType, GoalType, JtbdAction, JtbdRecord, PrimaryGoal, Priority};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::error::{ClientError, Result};
use crate::hooks::jtbd::JtbdRepository;

/// Goal-tracking records held in memory, optionally loaded from a JSON file
/// containing an array of records.
pub struct InMemoryJtbdRepository {
    records: RwLock<Vec<JtbdRecord>>,
}

impl InMemoryJtbdRepository {
    pub fn new(records: Vec<JtbdRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn with_sample_data() -> Result<Self> {
        Ok(Self::new(sample_records()?))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Repository(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let records: Vec<JtbdRecord> = serde_json::from_str(&content).map_err(|e| {
            ClientError::Repository(format!("Invalid goal data in {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded {} goal tracking records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    /// Adds a record or replaces the one with the same customer id
    pub fn upsert(&self, record: JtbdRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.iter_mut().find(|r| r.customer_id == record.customer_id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }
}

#[async_trait]
impl JtbdRepository for InMemoryJtbdRepository {
    async fn fetch_all(&self) -> Result<Vec<JtbdRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<JtbdRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.customer_id == customer_id)
            .cloned())
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ClientError::Repository(format!("invalid sample date {}-{:02}-{:02}", year, month, day))
    })
}

fn action(
    id: &str,
    title: &str,
    priority: Priority,
    action_type: ActionType,
    deadline: Option<NaiveDate>,
    estimated_value: Option<f64>,
) -> JtbdAction {
    JtbdAction {
        id: id.to_string(),
        title: title.to_string(),
        priority,
        action_type,
        deadline,
        estimated_value,
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    customer_id: &str,
    customer_name: &str,
    goal_type: GoalType,
    description: &str,
    target_amount: f64,
    current_progress: f64,
    target_date: NaiveDate,
    on_track: bool,
    monthly_required: f64,
    actions: Vec<JtbdAction>,
) -> JtbdRecord {
    JtbdRecord {
        customer_id: customer_id.to_string(),
        customer_name: customer_name.to_string(),
        primary_goal: PrimaryGoal {
            goal_type,
            description: description.to_string(),
            target_amount,
            current_progress,
            target_date,
            on_track,
            monthly_required,
        },
        actions,
    }
}

/// Demo dataset used by the CLI when no data file is given
pub fn sample_records() -> Result<Vec<JtbdRecord>> {
    Ok(vec![
        record(
            "C-1001",
            "Rajesh Kumar",
            GoalType::Retirement,
            "Retire at 55 with a corpus of 3 crore",
            30_000_000.0,
            42.0,
            date(2035, 3, 31)?,
            false,
            45_000.0,
            vec![
                action(
                    "A-1",
                    "Increase monthly SIP by 10,000",
                    Priority::Critical,
                    ActionType::SipIncrease,
                    Some(date(2025, 1, 15)?),
                    Some(120_000.0),
                ),
                action(
                    "A-2",
                    "Review term insurance cover",
                    Priority::High,
                    ActionType::InsuranceReview,
                    Some(date(2025, 2, 28)?),
                    None,
                ),
            ],
        ),
        record(
            "C-1002",
            "Priya Sharma",
            GoalType::ChildEducation,
            "Engineering fees for daughter",
            2_500_000.0,
            78.0,
            date(2029, 6, 30)?,
            true,
            18_000.0,
            vec![action(
                "A-3",
                "Move equity gains into debt funds",
                Priority::Medium,
                ActionType::Rebalance,
                Some(date(2025, 4, 10)?),
                Some(35_000.0),
            )],
        ),
        record(
            "C-1003",
            "Anil Mehta",
            GoalType::HomePurchase,
            "Down payment for a flat in Pune",
            4_000_000.0,
            22.0,
            date(2027, 12, 31)?,
            false,
            60_000.0,
            vec![
                action(
                    "A-4",
                    "Claim 80C deductions before March",
                    Priority::High,
                    ActionType::TaxPlanning,
                    Some(date(2025, 3, 15)?),
                    Some(46_800.0),
                ),
                action(
                    "A-5",
                    "Update KYC documents",
                    Priority::Low,
                    ActionType::DocumentUpdate,
                    None,
                    None,
                ),
            ],
        ),
        record(
            "C-1004",
            "Sunita Rao",
            GoalType::WealthCreation,
            "Grow portfolio to 1 crore",
            10_000_000.0,
            55.0,
            date(2032, 1, 1)?,
            true,
            30_000.0,
            vec![
                action(
                    "A-6",
                    "Quarterly portfolio review call",
                    Priority::Medium,
                    ActionType::FollowUp,
                    Some(date(2025, 1, 20)?),
                    None,
                ),
                action(
                    "A-7",
                    "Top up ELSS allocation",
                    Priority::Low,
                    ActionType::SipIncrease,
                    None,
                    Some(15_000.0),
                ),
            ],
        ),
        record(
            "C-1005",
            "Vikram Singh",
            GoalType::EmergencyFund,
            "Six months of expenses in liquid funds",
            600_000.0,
            90.0,
            date(2025, 9, 30)?,
            true,
            5_000.0,
            Vec::new(),
        ),
    ])
}
