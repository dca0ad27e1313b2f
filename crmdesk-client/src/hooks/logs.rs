use serde::Serialize;
use shared_types::{LogCleanupResponse, LogFilters, LogPage, LogStats};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::{QueryClient, QueryKey, QuerySnapshot};

const LIST_STALE_TIME: Duration = Duration::from_secs(10);
const STATS_STALE_TIME: Duration = Duration::from_secs(30);

pub mod keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new("logs")
    }

    pub fn list(filters: &LogFilters) -> QueryKey {
        all().segment("list").with(filters)
    }

    pub fn stats() -> QueryKey {
        all().segment("stats")
    }
}

#[derive(Serialize)]
struct CleanupParams {
    days: u32,
}

#[derive(Clone)]
pub struct LogHooks {
    api: ApiClient,
    queries: QueryClient,
}

impl LogHooks {
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self { api, queries }
    }

    /// One page of log entries matching `filters`
    pub async fn use_logs(&self, filters: &LogFilters) -> Result<Arc<LogPage>> {
        let api = self.api.clone();
        let filters_owned = filters.clone();
        let options = self.queries.defaults().with_stale_time(LIST_STALE_TIME);

        self.queries
            .fetch(keys::list(filters), options, move || {
                let api = api.clone();
                let filters = filters_owned.clone();
                async move { api.get_with_query::<LogPage, _>("/logs", &filters).await }
            })
            .await
    }

    pub fn peek_logs(&self, filters: &LogFilters) -> QuerySnapshot<LogPage> {
        let page = filters.page;
        let page_size = filters.page_size;
        self.queries.peek(&keys::list(filters), move || LogPage {
            page,
            page_size,
            ..Default::default()
        })
    }

    /// Error and warning counts over the last hour, day and week
    pub async fn use_log_stats(&self) -> Result<Arc<LogStats>> {
        let api = self.api.clone();
        let options = self.queries.defaults().with_stale_time(STATS_STALE_TIME);

        self.queries
            .fetch(keys::stats(), options, move || {
                let api = api.clone();
                async move { api.get::<LogStats>("/logs/stats").await }
            })
            .await
    }

    pub fn peek_log_stats(&self) -> QuerySnapshot<LogStats> {
        self.queries.peek(&keys::stats(), LogStats::default)
    }

    /// Deletes entries older than `days` and invalidates every log query
    pub async fn cleanup_logs(&self, days: u32) -> Result<LogCleanupResponse> {
        let params = CleanupParams { days };
        let response: LogCleanupResponse = self
            .queries
            .mutate(self.api.delete_with_query("/logs/cleanup", &params), &[keys::all()])
            .await?;

        tracing::info!("Removed {} log entries older than {} days", response.deleted_count, days);
        Ok(response)
    }
}
