use serde::Serialize;
use shared_types::{ImportSession, ImportStatus, StagingRecord, StagingStatus};
use std::collections::HashMap;

/// Percentage of successfully imported rows, 0 for an empty session
pub fn success_rate(session: &ImportSession) -> f64 {
    if session.total_records == 0 {
        return 0.0;
    }
    session.successful_records as f64 / session.total_records as f64 * 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportOverview {
    pub total_sessions: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_records: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    pub duplicate_records: u64,
    pub overall_success_rate: f64,
}

pub fn summarize_sessions(sessions: &[ImportSession]) -> ImportOverview {
    let mut overview = ImportOverview {
        total_sessions: sessions.len(),
        ..Default::default()
    };

    for session in sessions {
        match session.status {
            ImportStatus::Completed | ImportStatus::CompletedWithErrors => overview.completed += 1,
            ImportStatus::Failed => overview.failed += 1,
            status if !status.is_terminal() => overview.in_progress += 1,
            _ => {}
        }
        overview.total_records += session.total_records;
        overview.successful_records += session.successful_records;
        overview.failed_records += session.failed_records;
        overview.duplicate_records += session.duplicate_records;
    }

    if overview.total_records > 0 {
        overview.overall_success_rate =
            overview.successful_records as f64 / overview.total_records as f64 * 100.0;
    }

    overview
}

pub fn count_by_status(records: &[StagingRecord]) -> HashMap<StagingStatus, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

/// Rows carrying at least one error message
pub fn records_with_errors(records: &[StagingRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.errors.as_ref().is_some_and(|e| !e.is_empty()))
        .count()
}
