//! Domain hooks.
//!
//! Each hook pairs a cache key with a fetch against the API (or, for JTBD, an
//! injected repository) and applies a pure transform from `insights` to the
//! cached response. Mutations invalidate the keys they affect before
//! returning.

pub mod contacts;
pub mod imports;
pub mod jtbd;
pub mod logs;
pub mod transactions;

pub use contacts::ContactHooks;
pub use imports::ImportHooks;
pub use jtbd::{JtbdHooks, JtbdRepository};
pub use logs::LogHooks;
pub use transactions::TransactionHooks;

use crate::http::ApiClient;
use crate::query::QueryClient;

/// Every API-backed hook over one client and one shared cache
#[derive(Clone)]
pub struct CrmHooks {
    pub contacts: ContactHooks,
    pub logs: LogHooks,
    pub imports: ImportHooks,
    pub transactions: TransactionHooks,
}

impl CrmHooks {
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self {
            contacts: ContactHooks::new(api.clone(), queries.clone()),
            logs: LogHooks::new(api.clone(), queries.clone()),
            imports: ImportHooks::new(api.clone(), queries.clone()),
            transactions: TransactionHooks::new(api, queries),
        }
    }
}
