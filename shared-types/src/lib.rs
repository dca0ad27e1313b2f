use serde::{Deserialize, Serialize};

pub mod contact;
pub mod import;
pub mod jtbd;
pub mod log;
pub mod transaction;

pub use contact::{
    BulkCreateContactsRequest, BulkCreateContactsResponse, Channel, ChannelType,
    CheckExistsParams, CheckExistsResponse, Contact, ContactListParams, ContactStats,
    ContactsResponse, CreateChannelRequest, CreateContactRequest, UpdateChannelRequest,
    UpdateContactRequest,
};
pub use import::{
    ImportSession, ImportSessionsResponse, ImportStatus, StagingRecord, StagingRecordParams,
    StagingRecordsResponse, StagingStatus,
};
pub use jtbd::{ActionType, GoalType, JtbdAction, JtbdRecord, PrimaryGoal, Priority};
pub use log::{
    LevelCounts, LogCleanupResponse, LogEntry, LogFilters, LogLevel, LogPage, LogStats,
    SourceCount,
};
pub use transaction::{
    CreateTransactionRequest, Transaction, TransactionFilters, TransactionSummary,
    TransactionType, TransactionsResponse, UpdateTransactionRequest,
};

/// Envelope wrapping every API response body.
///
/// `data` is only meaningful when `success` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
