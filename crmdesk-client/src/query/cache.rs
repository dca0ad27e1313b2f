use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

use super::{QueryKey, QueryOptions};
use crate::error::{ClientError, Result};

type AnyData = Arc<dyn Any + Send + Sync>;
/// Resolves to `None` when the fetch was aborted before finishing
type SharedFetch = Shared<BoxFuture<'static, Option<Result<AnyData>>>>;
type Entries = Arc<Mutex<HashMap<QueryKey, CacheEntry>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing cached yet
    Pending,
    Success,
    /// Cached data past its staleness window or invalidated by a mutation
    Stale,
    /// The last fetch failed and no data is cached
    Error,
}

/// What a consumer sees for a key right now, with the placeholder standing in
/// for data that has not arrived yet.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub data: Arc<T>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub error: Option<ClientError>,
}

impl<T> QuerySnapshot<T> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.status, QueryStatus::Pending | QueryStatus::Error)
    }
}

struct InFlight {
    /// Unique across the whole client, so a result is only accepted by the
    /// entry that started it
    id: u64,
    future: SharedFetch,
    abort: AbortHandle,
}

struct CacheEntry {
    data: Option<AnyData>,
    updated_at: Option<Instant>,
    invalidated: bool,
    error: Option<ClientError>,
    in_flight: Option<InFlight>,
    last_accessed: Instant,
    stale_time: Duration,
    gc_time: Duration,
}

impl CacheEntry {
    fn new(now: Instant, options: &QueryOptions) -> Self {
        Self {
            data: None,
            updated_at: None,
            invalidated: false,
            error: None,
            in_flight: None,
            last_accessed: now,
            stale_time: options.stale_time,
            gc_time: options.gc_time,
        }
    }

    /// Aborts the running fetch. Its waiters see the abort and read the
    /// entry again.
    fn cancel_fetch(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        !self.invalidated
            && self
                .updated_at
                .is_some_and(|at| now.duration_since(at) < self.stale_time)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.in_flight.is_none() && now.duration_since(self.last_accessed) >= self.gc_time
    }
}

enum Lookup {
    Ready(AnyData),
    Wait(SharedFetch),
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> Result<Arc<T>> {
    data.downcast::<T>()
        .map_err(|_| ClientError::Decode(format!("cached value for {} has another type", key)))
}

/// Shared query cache. Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct QueryClient {
    entries: Entries,
    next_fetch_id: Arc<AtomicU64>,
    defaults: QueryOptions,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryClient {
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_fetch_id: Arc::new(AtomicU64::new(0)),
            defaults,
        }
    }

    /// Options new queries start from; hooks override the staleness window
    pub fn defaults(&self) -> QueryOptions {
        self.defaults
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key`, fetching it when needed.
    ///
    /// Fresh data is returned as is. Data past its staleness window is
    /// returned immediately while a background refetch starts. Missing or
    /// invalidated data waits for a fetch; concurrent callers share the same
    /// request. The fetch runs on its own task, so dropping the returned
    /// future does not abort the request. When invalidation aborts the fetch
    /// being waited on, the read starts over against the entry.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetcher: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetcher = Arc::new(fetcher);
        loop {
            let pending = match self.lookup(&key, options, &fetcher) {
                Lookup::Ready(data) => return downcast(&key, data),
                Lookup::Wait(pending) => pending,
            };

            match pending.await {
                Some(result) => return downcast(&key, result?),
                None => tracing::debug!("Fetch for {} was aborted, reading again", key),
            }
        }
    }

    fn lookup<T, F, Fut>(&self, key: &QueryKey, options: QueryOptions, fetcher: &Arc<F>) -> Lookup
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut entries = self.lock();
        let now = Instant::now();
        entries.retain(|k, e| k == key || !e.is_expired(now));

        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(now, &options));
        entry.last_accessed = now;
        entry.stale_time = options.stale_time;
        entry.gc_time = options.gc_time;

        match entry.data.clone() {
            Some(data) if entry.is_fresh(now) => {
                tracing::debug!("Cache hit for {}", key);
                Lookup::Ready(data)
            }
            Some(data) if !entry.invalidated => {
                tracing::debug!("Serving stale {} while refetching", key);
                if entry.in_flight.is_none() {
                    let _ = self.start_fetch(entry, key, options, Arc::clone(fetcher));
                }
                Lookup::Ready(data)
            }
            _ => match entry.in_flight.as_ref().map(|f| f.future.clone()) {
                Some(future) => {
                    tracing::debug!("Joining in-flight request for {}", key);
                    Lookup::Wait(future)
                }
                None => Lookup::Wait(self.start_fetch(entry, key, options, Arc::clone(fetcher))),
            },
        }
    }

    fn start_fetch<T, F, Fut>(&self, entry: &mut CacheEntry, key: &QueryKey, options: QueryOptions, fetcher: Arc<F>) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Fetching {} (#{})", key, id);

        let entries = Arc::clone(&self.entries);
        let task_key = key.clone();
        let retry = options.retry;

        let handle = tokio::spawn(async move {
            let result = retry
                .run(|| (*fetcher)())
                .await
                .map(|value| Arc::new(value) as AnyData);
            complete_fetch(&entries, &task_key, id, &result);
            result
        });
        let abort = handle.abort_handle();

        let future = async move {
            match handle.await {
                Ok(result) => Some(result),
                Err(e) if e.is_cancelled() => None,
                Err(e) => Some(Err(ClientError::Network(format!("fetch task failed: {}", e)))),
            }
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            id,
            future: future.clone(),
            abort,
        });
        future
    }

    /// Cached value, if any, regardless of staleness
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = self.lock();
        let data = entries.get(key)?.data.clone()?;
        data.downcast::<T>().ok()
    }

    /// Current state of `key`, using `placeholder` when nothing usable is cached
    pub fn peek<T, P>(&self, key: &QueryKey, placeholder: P) -> QuerySnapshot<T>
    where
        T: Send + Sync + 'static,
        P: FnOnce() -> T,
    {
        let entries = self.lock();
        let now = Instant::now();

        let Some(entry) = entries.get(key) else {
            return QuerySnapshot {
                data: Arc::new(placeholder()),
                status: QueryStatus::Pending,
                is_fetching: false,
                error: None,
            };
        };

        let is_fetching = entry.in_flight.is_some();
        match entry.data.clone().and_then(|d| d.downcast::<T>().ok()) {
            Some(data) => QuerySnapshot {
                data,
                status: if entry.is_fresh(now) {
                    QueryStatus::Success
                } else {
                    QueryStatus::Stale
                },
                is_fetching,
                error: entry.error.clone(),
            },
            None => QuerySnapshot {
                data: Arc::new(placeholder()),
                status: if entry.error.is_some() && !is_fetching {
                    QueryStatus::Error
                } else {
                    QueryStatus::Pending
                },
                is_fetching,
                error: entry.error.clone(),
            },
        }
    }

    /// Seeds or replaces the cached value, discarding any in-flight fetch
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let mut entries = self.lock();
        let now = Instant::now();
        let entry = entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(now, &self.defaults));
        entry.data = Some(Arc::new(value));
        entry.updated_at = Some(now);
        entry.last_accessed = now;
        entry.invalidated = false;
        entry.error = None;
        entry.cancel_fetch();
    }

    /// Marks every entry under `prefix` stale. Fetches already in flight for
    /// those keys are aborted so their results cannot overwrite newer data;
    /// the next read starts a new request.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                entry.cancel_fetch();
                count += 1;
            }
        }
        tracing::debug!("Invalidated {} queries under {}", count, prefix);
        count
    }

    /// Drops every entry under `prefix`, aborting their fetches
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, entry| {
            if key.starts_with(prefix) {
                entry.cancel_fetch();
                false
            } else {
                true
            }
        });
        before - entries.len()
    }

    /// Runs a mutation and, on success, invalidates `keys` before returning.
    /// Failed mutations leave the cache untouched.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, keys: &[QueryKey]) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let value = mutation.await?;
        for key in keys {
            self.invalidate(key);
        }
        Ok(value)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Evicts idle entries past their GC window
    pub fn collect_garbage(&self) -> usize {
        collect_garbage(&self.entries)
    }

    /// Collects garbage every `interval` until the client is dropped
    pub fn spawn_garbage_collector(&self, interval: Duration) -> JoinHandle<()> {
        let entries: Weak<Mutex<HashMap<QueryKey, CacheEntry>>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let evicted = collect_garbage(&entries);
                if evicted > 0 {
                    tracing::debug!("Evicted {} idle queries", evicted);
                }
            }
        })
    }
}

fn collect_garbage(entries: &Mutex<HashMap<QueryKey, CacheEntry>>) -> usize {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}

fn complete_fetch(entries: &Mutex<HashMap<QueryKey, CacheEntry>>, key: &QueryKey, id: u64, result: &Result<AnyData>) {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };
    if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
        tracing::debug!("Discarding superseded result #{} for {}", id, key);
        return;
    }

    let now = Instant::now();
    match result {
        Ok(data) => {
            entry.data = Some(Arc::clone(data));
            entry.updated_at = Some(now);
            entry.invalidated = false;
            entry.error = None;
        }
        Err(e) => {
            tracing::warn!("Query {} failed: {}", key, e);
            entry.error = Some(e.clone());
        }
    }
    entry.last_accessed = now;
    entry.in_flight = None;
}
