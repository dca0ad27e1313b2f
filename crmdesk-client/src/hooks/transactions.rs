use serde::de::IgnoredAny;
use shared_types::{
    CreateTransactionRequest, Transaction, TransactionFilters, TransactionSummary,
    TransactionsResponse, UpdateTransactionRequest,
};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::{QueryClient, QueryKey, QueryOptions, QuerySnapshot};

const LIST_STALE_TIME: Duration = Duration::from_secs(30);
const SUMMARY_STALE_TIME: Duration = Duration::from_secs(60);

pub mod keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new("transactions")
    }

    pub fn lists() -> QueryKey {
        all().segment("list")
    }

    pub fn list(filters: &TransactionFilters) -> QueryKey {
        lists().with(filters)
    }

    pub fn detail(id: i64) -> QueryKey {
        all().segment("detail").with(&id)
    }

    pub fn summary() -> QueryKey {
        all().segment("summary")
    }
}

fn mutation_keys(id: Option<i64>) -> Vec<QueryKey> {
    let mut stale = vec![keys::lists(), keys::summary()];
    if let Some(id) = id {
        stale.push(keys::detail(id));
    }
    stale
}

#[derive(Clone)]
pub struct TransactionHooks {
    api: ApiClient,
    queries: QueryClient,
}

impl TransactionHooks {
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self { api, queries }
    }

    fn options(&self, stale_time: Duration) -> QueryOptions {
        self.queries.defaults().with_stale_time(stale_time)
    }

    pub async fn use_transactions(&self, filters: &TransactionFilters) -> Result<Arc<TransactionsResponse>> {
        let api = self.api.clone();
        let filters_owned = filters.clone();

        self.queries
            .fetch(keys::list(filters), self.options(LIST_STALE_TIME), move || {
                let api = api.clone();
                let filters = filters_owned.clone();
                async move {
                    api.get_with_query::<TransactionsResponse, _>("/transactions", &filters)
                        .await
                }
            })
            .await
    }

    pub fn peek_transactions(&self, filters: &TransactionFilters) -> QuerySnapshot<TransactionsResponse> {
        let page = filters.page.unwrap_or(1);
        let page_size = filters.page_size.unwrap_or(50);
        self.queries.peek(&keys::list(filters), move || TransactionsResponse {
            transactions: Vec::new(),
            total: 0,
            page,
            page_size,
        })
    }

    pub async fn use_transaction(&self, id: i64) -> Result<Arc<Transaction>> {
        let api = self.api.clone();

        self.queries
            .fetch(keys::detail(id), self.options(LIST_STALE_TIME), move || {
                let api = api.clone();
                async move { api.get::<Transaction>(&format!("/transactions/{}", id)).await }
            })
            .await
    }

    pub async fn use_transaction_summary(&self) -> Result<Arc<TransactionSummary>> {
        let api = self.api.clone();

        self.queries
            .fetch(keys::summary(), self.options(SUMMARY_STALE_TIME), move || {
                let api = api.clone();
                async move { api.get::<TransactionSummary>("/transactions/summary").await }
            })
            .await
    }

    pub async fn create_transaction(&self, request: &CreateTransactionRequest) -> Result<Transaction> {
        self.queries
            .mutate(self.api.post("/transactions", request), &mutation_keys(None))
            .await
    }

    /// Replaces the editable fields of a transaction
    pub async fn update_transaction(&self, id: i64, request: &UpdateTransactionRequest) -> Result<Transaction> {
        let endpoint = format!("/transactions/{}", id);
        self.queries
            .mutate(self.api.put(&endpoint, request), &mutation_keys(Some(id)))
            .await
    }

    /// Changes only the fields present in `request`, e.g. the duplicate flag
    pub async fn patch_transaction(&self, id: i64, request: &UpdateTransactionRequest) -> Result<Transaction> {
        let endpoint = format!("/transactions/{}", id);
        self.queries
            .mutate(self.api.patch(&endpoint, request), &mutation_keys(Some(id)))
            .await
    }

    /// Soft delete; the backend keeps the row out of listings and totals
    pub async fn delete_transaction(&self, id: i64) -> Result<()> {
        let endpoint = format!("/transactions/{}", id);
        self.queries
            .mutate(self.api.delete::<IgnoredAny>(&endpoint), &mutation_keys(Some(id)))
            .await?;
        Ok(())
    }
}
