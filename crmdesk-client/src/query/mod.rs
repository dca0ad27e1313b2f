//! Keyed cache of request results.
//!
//! A [`QueryClient`] shares one in-flight request per [`QueryKey`], keeps
//! successful results for a staleness window, retries transient failures, and
//! drops idle entries after their garbage-collection window. Mutations
//! invalidate keys by prefix before returning.

mod cache;
mod key;
mod options;
mod retry;

pub use cache::{QueryClient, QuerySnapshot, QueryStatus};
pub use key::QueryKey;
pub use options::QueryOptions;
pub use retry::RetryPolicy;
