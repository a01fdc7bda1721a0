//! Keyed cache of asynchronous fetch results
//!
//! `QueryCache` stores one entry per key with an optional freshness
//! window, shares a single in-flight call among concurrent requests for
//! the same key, and retains errors for the caller to render. It is a
//! plain struct owned by whoever drives the UI; there is no process-wide
//! cache state.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::transport::ApiError;

/// Snapshot of a cache entry handed to callers
#[derive(Debug, Clone)]
pub struct EntryView<T> {
    pub data: Option<T>,
    pub error: Option<Arc<ApiError>>,
    pub is_loading: bool,
}

impl<T> EntryView<T> {
    fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }

    fn loading() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: true,
        }
    }

    fn success(value: T) -> Self {
        Self {
            data: Some(value),
            error: None,
            is_loading: false,
        }
    }

    fn error(error: Arc<ApiError>) -> Self {
        Self {
            data: None,
            error: Some(error),
            is_loading: false,
        }
    }

    /// Collapses a settled view into its value or error
    ///
    /// Idle and loading views carry neither and map to `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, Arc<ApiError>> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (data, None) => Ok(data),
        }
    }
}

/// One in-flight fetch, shareable among every caller waiting on the key
type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, Arc<ApiError>>>>;

enum Entry<T> {
    Pending {
        generation: u64,
        shared: SharedFetch<T>,
    },
    Success {
        value: T,
        fetched_at: Instant,
    },
    Error {
        error: Arc<ApiError>,
        at: Instant,
    },
}

/// Keyed store of async results with per-entry freshness and in-flight
/// deduplication
pub struct QueryCache<K, T> {
    entries: Mutex<HashMap<K, Entry<T>>>,
    /// Freshness window for successful entries; `None` means a success
    /// never goes stale
    fresh_for: Option<Duration>,
    /// Tags each dispatch so a settled fetch can tell whether it still
    /// owns its entry
    generations: AtomicU64,
}

impl<K, T> QueryCache<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(fresh_for: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fresh_for,
            generations: AtomicU64::new(0),
        }
    }

    /// Returns the entry for `key`, fetching if needed
    ///
    /// A fresh `success` entry is served without a network call. A
    /// `pending` entry's in-flight call is joined, never duplicated. A
    /// stale, failed, or absent entry dispatches `fetcher` and awaits it.
    /// `key = None` or `enabled = false` yields an idle view and issues
    /// nothing.
    pub async fn get_or_fetch<F, Fut>(&self, key: Option<K>, enabled: bool, fetcher: F) -> EntryView<T>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let Some(key) = key else {
            return EntryView::idle();
        };
        if !enabled {
            return EntryView::idle();
        }

        let (generation, shared) = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(Entry::Success { value, fetched_at }) if self.is_fresh(*fetched_at) => {
                    return EntryView::success(value.clone());
                }
                Some(Entry::Pending { generation, shared }) => (*generation, shared.clone()),
                // Never fetched, stale, or a retained error being retried.
                _ => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                    debug!(key = ?key, generation, "dispatching fetch");
                    let future = fetcher(key.clone());
                    let shared: SharedFetch<T> =
                        async move { future.await.map_err(Arc::new) }.boxed().shared();
                    entries.insert(
                        key.clone(),
                        Entry::Pending {
                            generation,
                            shared: shared.clone(),
                        },
                    );
                    (generation, shared)
                }
            }
        };

        let result = shared.await;
        self.settle(&key, generation, &result);
        match result {
            Ok(value) => EntryView::success(value),
            Err(error) => EntryView::error(error),
        }
    }

    /// Reports the current state of `key` without dispatching
    ///
    /// A stale success still returns its value; staleness only matters
    /// when deciding whether to re-fetch.
    pub fn peek(&self, key: &K) -> EntryView<T> {
        let entries = self.entries.lock();
        match entries.get(key) {
            None => EntryView::idle(),
            Some(Entry::Pending { .. }) => EntryView::loading(),
            Some(Entry::Success { value, .. }) => EntryView::success(value.clone()),
            Some(Entry::Error { error, .. }) => EntryView::error(error.clone()),
        }
    }

    /// Drops settled entries older than `max_age`; in-flight entries stay
    ///
    /// Returns the number of entries removed.
    pub fn purge_older_than(&self, max_age: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| match entry {
            Entry::Pending { .. } => true,
            Entry::Success { fetched_at, .. } => fetched_at.elapsed() <= max_age,
            Entry::Error { at, .. } => at.elapsed() <= max_age,
        });
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn is_fresh(&self, fetched_at: Instant) -> bool {
        self.fresh_for
            .map_or(true, |window| fetched_at.elapsed() < window)
    }

    /// Records a settled fetch, unless a newer dispatch owns the entry
    fn settle(&self, key: &K, generation: u64, result: &Result<T, Arc<ApiError>>) {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(Entry::Pending {
                generation: current,
                ..
            }) if *current == generation => {}
            _ => return,
        }
        let entry = match result {
            Ok(value) => Entry::Success {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
            Err(error) => Entry::Error {
                error: error.clone(),
                at: Instant::now(),
            },
        };
        entries.insert(key.clone(), entry);
    }
}
