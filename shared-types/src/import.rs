use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle of a backend import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
    Cancelled,
    Staged,
}

impl ImportStatus {
    /// Whether the import job has stopped and its counts are final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportStatus::Completed
                | ImportStatus::CompletedWithErrors
                | ImportStatus::Failed
                | ImportStatus::Cancelled
        )
    }
}

/// Batch import run. Created by a backend job, read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportSession {
    pub id: String,
    pub import_type: String,
    pub status: ImportStatus,
    pub file_name: Option<String>,
    pub total_records: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    pub duplicate_records: u64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportSessionsResponse {
    pub sessions: Vec<ImportSession>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StagingStatus {
    Pending,
    Valid,
    Invalid,
    Duplicate,
    Imported,
    Failed,
    Skipped,
}

/// One row of an import session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StagingRecord {
    pub id: i64,
    pub session_id: String,
    pub row_number: u64,
    #[ts(type = "any")]
    pub raw_data: serde_json::Value,
    #[ts(type = "any")]
    pub mapped_data: Option<serde_json::Value>,
    pub status: StagingStatus,
    pub errors: Option<Vec<String>>,
    pub warnings: Option<Vec<String>>,
}

/// Query parameters of `GET /import/staging/{session_id}/records`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StagingRecordParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StagingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StagingRecordsResponse {
    pub records: Vec<StagingRecord>,
    pub total: u64,
}
