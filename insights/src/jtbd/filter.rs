use serde::{Deserialize, Serialize};
use shared_types::{ActionType, GoalType, JtbdRecord, Priority};

/// Record filters. Empty sets match everything; all filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JtbdFilters {
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub action_types: Vec<ActionType>,
    #[serde(default)]
    pub goal_types: Vec<GoalType>,
    #[serde(default)]
    pub on_track_only: bool,
    #[serde(default)]
    pub has_deadline: bool,
}

impl JtbdFilters {
    pub fn matches(&self, record: &JtbdRecord) -> bool {
        if !self.priorities.is_empty()
            && !record
                .actions
                .iter()
                .any(|a| self.priorities.contains(&a.priority))
        {
            return false;
        }

        if !self.action_types.is_empty()
            && !record
                .actions
                .iter()
                .any(|a| self.action_types.contains(&a.action_type))
        {
            return false;
        }

        if !self.goal_types.is_empty()
            && !self.goal_types.contains(&record.primary_goal.goal_type)
        {
            return false;
        }

        if self.on_track_only && !record.primary_goal.on_track {
            return false;
        }

        if self.has_deadline && !record.actions.iter().any(|a| a.deadline.is_some()) {
            return false;
        }

        true
    }
}

pub fn filter_records(records: &[JtbdRecord], filters: &JtbdFilters) -> Vec<JtbdRecord> {
    records
        .iter()
        .filter(|r| filters.matches(r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jtbd::fixtures::{action, date, record};

    #[test]
    fn test_empty_filters_keep_everything() {
        let records = vec![
            record("a", 10.0, true, vec![]),
            record("b", 90.0, false, vec![]),
        ];
        assert_eq!(filter_records(&records, &JtbdFilters::default()).len(), 2);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let mut with_deadline = action("1", Priority::High, Some(date(2025, 1, 10)), None);
        with_deadline.action_type = ActionType::Rebalance;
        let records = vec![
            record("a", 40.0, true, vec![with_deadline.clone()]),
            record("b", 40.0, false, vec![with_deadline]),
            record("c", 40.0, true, vec![action("2", Priority::High, None, None)]),
            record("d", 40.0, true, vec![action("3", Priority::Low, Some(date(2025, 1, 1)), None)]),
        ];

        let filters = JtbdFilters {
            priorities: vec![Priority::Critical, Priority::High],
            on_track_only: true,
            has_deadline: true,
            ..Default::default()
        };
        let out = filter_records(&records, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].customer_id, "a");

        let by_type = JtbdFilters {
            action_types: vec![ActionType::Rebalance],
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &by_type).len(), 2);

        let by_goal = JtbdFilters {
            goal_types: vec![GoalType::HomePurchase],
            ..Default::default()
        };
        assert!(filter_records(&records, &by_goal).is_empty());
    }
}
