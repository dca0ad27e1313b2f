//! Goal-tracking hooks.
//!
//! Records come from an injected [`JtbdRepository`] instead of the HTTP API,
//! but are cached and derived the same way as the API-backed hooks, so the
//! in-memory store can be swapped for a remote one without touching callers.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use insights::jtbd::{
    compute_metrics, customer_health, filter_records, goal_progress, goals_overview,
    sort_records, urgent_actions, CustomerHealth, GoalProgress, GoalsOverview, JtbdFilters,
    JtbdMetrics, JtbdSort, UrgentAction,
};
use shared_types::JtbdRecord;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::query::{QueryClient, QueryKey, QueryOptions};

const STALE_TIME: Duration = Duration::from_secs(300);

/// Source of goal-tracking records
#[async_trait]
pub trait JtbdRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<JtbdRecord>>;
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<JtbdRecord>>;
}

pub mod keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new("jtbd")
    }

    pub fn records() -> QueryKey {
        all().segment("records")
    }

    pub fn customer(customer_id: &str) -> QueryKey {
        all().segment("customer").segment(customer_id)
    }
}

#[derive(Clone)]
pub struct JtbdHooks {
    repository: Arc<dyn JtbdRepository>,
    queries: QueryClient,
    today: Option<NaiveDate>,
}

impl JtbdHooks {
    pub fn new(repository: Arc<dyn JtbdRepository>, queries: QueryClient) -> Self {
        Self {
            repository,
            queries,
            today: None,
        }
    }

    /// Pins the date used for deadlines and months remaining
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn options(&self) -> QueryOptions {
        self.queries.defaults().with_stale_time(STALE_TIME)
    }

    pub async fn records(&self) -> Result<Arc<Vec<JtbdRecord>>> {
        let repository = Arc::clone(&self.repository);

        self.queries
            .fetch(keys::records(), self.options(), move || {
                let repository = Arc::clone(&repository);
                async move { repository.fetch_all().await }
            })
            .await
    }

    async fn customer(&self, customer_id: &str) -> Result<JtbdRecord> {
        let repository = Arc::clone(&self.repository);
        let id = customer_id.to_string();

        let record = self
            .queries
            .fetch(keys::customer(customer_id), self.options(), move || {
                let repository = Arc::clone(&repository);
                let id = id.clone();
                async move { repository.fetch_customer(&id).await }
            })
            .await?;

        match record.as_ref() {
            Some(record) => Ok(record.clone()),
            None => Err(ClientError::NotFound(format!(
                "No goal tracking record for customer {}",
                customer_id
            ))),
        }
    }

    /// Records matching every filter, in the requested order
    pub async fn use_jtbd_data(&self, filters: &JtbdFilters, sort: JtbdSort) -> Result<Vec<JtbdRecord>> {
        let records = self.records().await?;
        let mut selected = filter_records(&records, filters);
        sort_records(&mut selected, sort);
        Ok(selected)
    }

    /// Aggregates over the records matching `filters`
    pub async fn use_jtbd_metrics(&self, filters: &JtbdFilters) -> Result<JtbdMetrics> {
        let records = self.records().await?;
        Ok(compute_metrics(&filter_records(&records, filters), self.today()))
    }

    pub async fn use_customer_health(&self, customer_id: &str) -> Result<CustomerHealth> {
        let record = self.customer(customer_id).await?;
        Ok(customer_health(&record))
    }

    pub async fn use_urgent_actions(&self, threshold_days: i64) -> Result<Vec<UrgentAction>> {
        let records = self.records().await?;
        Ok(urgent_actions(&records, self.today(), threshold_days))
    }

    pub async fn use_goal_progress(&self, customer_id: &str) -> Result<GoalProgress> {
        let record = self.customer(customer_id).await?;
        Ok(goal_progress(&record, self.today()))
    }

    pub async fn use_goals_overview(&self) -> Result<GoalsOverview> {
        let records = self.records().await?;
        Ok(goals_overview(&records, self.today()))
    }

    /// Drops cached records so the next read goes back to the repository
    pub fn refresh(&self) -> usize {
        self.queries.invalidate(&keys::all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::jtbd_store::{sample_records, InMemoryJtbdRepository};
    use insights::jtbd::{HealthStatus, SortDirection, SortField};
    use shared_types::Priority;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepository {
        inner: InMemoryJtbdRepository,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JtbdRepository for CountingRepository {
        async fn fetch_all(&self) -> Result<Vec<JtbdRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_all().await
        }

        async fn fetch_customer(&self, customer_id: &str) -> Result<Option<JtbdRecord>> {
            self.inner.fetch_customer(customer_id).await
        }
    }

    fn hooks() -> (JtbdHooks, Arc<CountingRepository>) {
        let repository = Arc::new(CountingRepository {
            inner: InMemoryJtbdRepository::new(sample_records().unwrap()),
            calls: AtomicUsize::new(0),
        });
        let hooks = JtbdHooks::new(repository.clone(), QueryClient::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        (hooks, repository)
    }

    #[tokio::test]
    async fn test_records_are_cached_until_refresh() {
        let (hooks, repository) = hooks();

        hooks.use_jtbd_metrics(&JtbdFilters::default()).await.unwrap();
        hooks.use_goals_overview().await.unwrap();
        assert_eq!(repository.calls.load(Ordering::SeqCst), 1);

        hooks.refresh();
        hooks.use_urgent_actions(30).await.unwrap();
        assert_eq!(repository.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_priority_sort_descending_is_non_increasing() {
        let (hooks, _) = hooks();
        let sort = JtbdSort {
            field: SortField::Priority,
            direction: SortDirection::Desc,
        };

        let records = hooks.use_jtbd_data(&JtbdFilters::default(), sort).await.unwrap();
        let ordinals: Vec<u8> = records
            .iter()
            .map(|r| r.actions.iter().map(|a| a.priority.ordinal()).min().unwrap_or(4))
            .collect();
        assert!(ordinals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_filters_narrow_metrics() {
        let (hooks, _) = hooks();
        let all = hooks.use_jtbd_metrics(&JtbdFilters::default()).await.unwrap();
        let critical = hooks
            .use_jtbd_metrics(&JtbdFilters {
                priorities: vec![Priority::Critical],
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(critical.total_actions <= all.total_actions);
        assert_eq!(critical.critical_actions, all.critical_actions);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (hooks, _) = hooks();
        let result = hooks.use_customer_health("C-999").await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_customer_lookups() {
        let (hooks, _) = hooks();
        let health = hooks.use_customer_health("C-1001").await.unwrap();
        assert_eq!(health.status, HealthStatus::NeedsAttention);

        let progress = hooks.use_goal_progress("C-1002").await.unwrap();
        assert_eq!(progress.customer_id, "C-1002");
        assert!(progress.months_remaining > 0);
    }
}
