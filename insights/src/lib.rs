//! Insights Crate
//!
//! Pure view-model derivations over records fetched from the CRM API or read
//! from a goal-tracking repository. Nothing in here performs I/O, so every
//! function can run against cached data, test fixtures, or a live backend.
//!
//! # Modules
//!
//! - `contacts`: status/type buckets, prefix frequencies, detail facts, search relevance
//! - `imports`: success rates and per-status counts for import sessions
//! - `jtbd`: filtering, sorting, aggregate metrics, health classification,
//!   urgent actions and goal progress for goal-tracking records
//!
//! # Example
//!
//! ```rust,ignore
//! use insights::contacts::derive_contact_list;
//!
//! let view = derive_contact_list(&response);
//! assert_eq!(view.by_status.active.len() + view.by_status.inactive.len(), view.contacts.len());
//! ```

pub mod contacts;
pub mod imports;
pub mod jtbd;

pub use contacts::{
    derive_contact_detail, derive_contact_list, search_relevance, ContactDetailView,
    ContactListView, ContactSearchHit, MIN_SEARCH_QUERY_LEN,
};
pub use imports::{success_rate, summarize_sessions, ImportOverview};
pub use jtbd::{
    HealthStatus, JtbdFilters, JtbdMetrics, JtbdSort, SortDirection, SortField, UrgentAction,
};
