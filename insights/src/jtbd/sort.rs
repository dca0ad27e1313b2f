use serde::{Deserialize, Serialize};
use shared_types::JtbdRecord;
use std::cmp::Ordering;

use super::{earliest_deadline, min_priority_ordinal, total_estimated_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Most urgent action of each record
    Priority,
    /// Earliest action deadline; records without one sort last when ascending
    Deadline,
    /// Sum of estimated action values
    Value,
    /// Progress of the primary goal
    Impact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JtbdSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for JtbdSort {
    fn default() -> Self {
        Self {
            field: SortField::Priority,
            direction: SortDirection::Asc,
        }
    }
}

fn compare(field: SortField, a: &JtbdRecord, b: &JtbdRecord) -> Ordering {
    match field {
        SortField::Priority => min_priority_ordinal(a).cmp(&min_priority_ordinal(b)),
        SortField::Deadline => match (earliest_deadline(a), earliest_deadline(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Value => total_estimated_value(a).total_cmp(&total_estimated_value(b)),
        SortField::Impact => a
            .primary_goal
            .current_progress
            .total_cmp(&b.primary_goal.current_progress),
    }
}

/// Stable sort; records with equal keys keep their input order in both
/// directions.
pub fn sort_records(records: &mut [JtbdRecord], sort: JtbdSort) {
    records.sort_by(|a, b| {
        let ordering = compare(sort.field, a, b);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jtbd::fixtures::{action, date, record};
    use shared_types::Priority;

    fn ids(records: &[JtbdRecord]) -> Vec<&str> {
        records.iter().map(|r| r.customer_id.as_str()).collect()
    }

    #[test]
    fn test_priority_sort_uses_minimum_ordinal() {
        let mut records = vec![
            record("low", 10.0, true, vec![action("1", Priority::Low, None, None)]),
            record(
                "mixed",
                10.0,
                true,
                vec![
                    action("2", Priority::Low, None, None),
                    action("3", Priority::Critical, None, None),
                ],
            ),
            record("high", 10.0, true, vec![action("4", Priority::High, None, None)]),
        ];

        sort_records(&mut records, JtbdSort { field: SortField::Priority, direction: SortDirection::Asc });
        assert_eq!(ids(&records), vec!["mixed", "high", "low"]);
        let ordinals: Vec<u8> = records.iter().map(min_priority_ordinal).collect();
        assert!(ordinals.windows(2).all(|w| w[0] <= w[1]));

        sort_records(&mut records, JtbdSort { field: SortField::Priority, direction: SortDirection::Desc });
        let ordinals: Vec<u8> = records.iter().map(min_priority_ordinal).collect();
        assert!(ordinals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_deadline_sort_places_earliest_first() {
        let mut records = vec![
            record("none", 10.0, true, vec![action("1", Priority::Low, None, None)]),
            record("feb", 10.0, true, vec![action("2", Priority::Low, Some(date(2025, 2, 1)), None)]),
            record("jan", 10.0, true, vec![action("3", Priority::Low, Some(date(2025, 1, 10)), None)]),
        ];
        sort_records(&mut records, JtbdSort { field: SortField::Deadline, direction: SortDirection::Asc });
        assert_eq!(ids(&records), vec!["jan", "feb", "none"]);
    }

    #[test]
    fn test_value_sort_treats_missing_as_zero() {
        let mut records = vec![
            record("big", 10.0, true, vec![
                action("1", Priority::Low, None, Some(50_000.0)),
                action("2", Priority::Low, None, None),
            ]),
            record("none", 10.0, true, vec![action("3", Priority::Low, None, None)]),
            record("small", 10.0, true, vec![action("4", Priority::Low, None, Some(1_000.0))]),
        ];
        sort_records(&mut records, JtbdSort { field: SortField::Value, direction: SortDirection::Desc });
        assert_eq!(ids(&records), vec!["big", "small", "none"]);
    }

    #[test]
    fn test_impact_sort_is_stable() {
        let mut records = vec![
            record("a", 50.0, true, vec![]),
            record("b", 20.0, true, vec![]),
            record("c", 50.0, true, vec![]),
        ];
        sort_records(&mut records, JtbdSort { field: SortField::Impact, direction: SortDirection::Desc });
        assert_eq!(ids(&records), vec!["a", "c", "b"]);
    }
}
