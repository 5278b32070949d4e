// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Column lists, fetched lazily and cached
//!
//! [`ColumnCache`] is a cache-aside map from table name to the catalog's
//! answer for it. An absent entry means "not fetched yet"; an entry in the
//! [`ColumnState::Unknown`] state means the catalog has no such table, which
//! is remembered so it is not asked again.
//!
//! Entries are tagged with the catalog *generation* they were fetched under.
//! When the active connection changes the generation moves forward and
//! older entries are discarded on the next access.
//!
//! [`ColumnSource`] is the read path: cache first, then the catalog under a
//! timeout, with cancellation checked before and after each fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sqlsight_catalog::{Catalog, CatalogError, ColumnMetadata};
use tokio_util::sync::CancellationToken;

use crate::error::{SemanticError, SemanticResult};

/// Default bound on a single catalog lookup
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cached catalog answer for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnState {
    Fetched(Arc<Vec<ColumnMetadata>>),
    /// The catalog does not know the table
    Unknown,
}

impl ColumnState {
    pub fn columns(&self) -> Option<Arc<Vec<ColumnMetadata>>> {
        match self {
            ColumnState::Fetched(columns) => Some(Arc::clone(columns)),
            ColumnState::Unknown => None,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    generation: u64,
    /// Keyed by lowercase table name
    entries: HashMap<String, ColumnState>,
}

impl CacheInner {
    /// Move to `generation` if it is newer; false if it is stale
    fn sync_generation(&mut self, generation: u64) -> bool {
        if generation > self.generation {
            self.entries.clear();
            self.generation = generation;
        }
        generation == self.generation
    }
}

/// Per-snapshot column cache
#[derive(Debug, Default)]
pub struct ColumnCache {
    inner: Mutex<CacheInner>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str, generation: u64) -> Option<ColumnState> {
        let mut inner = self.inner.lock();
        if !inner.sync_generation(generation) {
            return None;
        }
        inner.entries.get(&table.to_lowercase()).cloned()
    }

    /// Store a state; ignored when `generation` is older than the cache's
    pub fn insert(&self, table: &str, state: ColumnState, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.sync_generation(generation) {
            inner.entries.insert(table.to_lowercase(), state);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog access for one resolution: cache, timeout and cancellation
#[derive(Clone)]
pub struct ColumnSource {
    catalog: Arc<dyn Catalog>,
    cache: Arc<ColumnCache>,
    generation: u64,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ColumnSource {
    pub fn new(catalog: Arc<dyn Catalog>, cache: Arc<ColumnCache>, generation: u64) -> Self {
        Self {
            catalog,
            cache,
            generation,
            timeout: DEFAULT_QUERY_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Columns of a base table
    ///
    /// `Ok(None)` means the catalog does not know the table. Transient
    /// catalog failures are reported as [`SemanticError::CatalogUnavailable`]
    /// and are not cached.
    pub async fn columns_of(&self, table: &str) -> SemanticResult<Option<Arc<Vec<ColumnMetadata>>>> {
        if let Some(state) = self.cache.get(table, self.generation) {
            return Ok(state.columns());
        }
        if self.cancel.is_cancelled() {
            return Err(SemanticError::Cancelled);
        }

        tracing::debug!(table, generation = self.generation, "fetching columns from catalog");
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return Err(SemanticError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.catalog.get_columns(table)) => result,
        };
        if self.cancel.is_cancelled() {
            return Err(SemanticError::Cancelled);
        }

        let state = match outcome {
            Ok(Ok(columns)) => ColumnState::Fetched(Arc::new(columns)),
            Ok(Err(err)) if !err.is_transient() => {
                tracing::debug!(table, error = %err, "catalog does not know table");
                ColumnState::Unknown
            }
            Ok(Err(err)) => {
                return Err(SemanticError::CatalogUnavailable {
                    table: table.to_string(),
                    source: err,
                });
            }
            Err(_) => {
                return Err(SemanticError::CatalogUnavailable {
                    table: table.to_string(),
                    source: CatalogError::QueryTimeout(self.timeout.as_secs()),
                });
            }
        };

        let columns = state.columns();
        self.cache.insert(table, state, self.generation);
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlsight_test_utils::MockCatalog;

    fn source(catalog: MockCatalog) -> (ColumnSource, Arc<MockCatalog>, Arc<ColumnCache>) {
        let catalog = Arc::new(catalog);
        let cache = Arc::new(ColumnCache::new());
        let source = ColumnSource::new(catalog.clone(), cache.clone(), 1);
        (source, catalog, cache)
    }

    #[test]
    fn test_cache_generation_discards_old_entries() {
        let cache = ColumnCache::new();
        cache.insert("city", ColumnState::Unknown, 1);
        assert_eq!(cache.get("CITY", 1), Some(ColumnState::Unknown));

        assert_eq!(cache.get("city", 2), None);
        assert!(cache.is_empty());

        cache.insert("city", ColumnState::Unknown, 1);
        assert!(cache.is_empty(), "stale generation must not be stored");
    }

    #[tokio::test]
    async fn test_columns_are_fetched_once() {
        let (source, catalog, cache) = source(MockCatalog::world());

        let first = source.columns_of("city").await.unwrap().unwrap();
        let second = source.columns_of("City").await.unwrap().unwrap();

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert_eq!(catalog.column_calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table_is_cached_as_unknown() {
        let (source, catalog, cache) = source(MockCatalog::world());

        assert_eq!(source.columns_of("nope").await.unwrap(), None);
        assert_eq!(source.columns_of("nope").await.unwrap(), None);
        assert_eq!(catalog.column_calls(), 1);
        assert_eq!(cache.get("nope", 1), Some(ColumnState::Unknown));
    }

    #[tokio::test]
    async fn test_transient_failure_is_not_cached() {
        let (source, catalog, cache) = source(MockCatalog::world().with_failing_table("city"));

        let err = source.columns_of("city").await.unwrap_err();
        assert!(matches!(err, SemanticError::CatalogUnavailable { ref table, .. } if table == "city"));
        assert!(cache.is_empty());

        let _ = source.columns_of("city").await;
        assert_eq!(catalog.column_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_unavailable() {
        let (source, _, cache) = source(MockCatalog::world().with_delay(Duration::from_secs(60)));
        let source = source.with_timeout(Duration::from_secs(1));

        let err = source.columns_of("city").await.unwrap_err();
        assert!(matches!(
            err,
            SemanticError::CatalogUnavailable {
                source: CatalogError::QueryTimeout(1),
                ..
            }
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let (source, catalog, cache) = source(MockCatalog::world());
        let token = CancellationToken::new();
        token.cancel();
        let source = source.with_cancellation(token);

        assert_eq!(source.columns_of("city").await.unwrap_err(), SemanticError::Cancelled);
        assert_eq!(catalog.column_calls(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_fetch_writes_nothing() {
        let (source, _, cache) = source(MockCatalog::world().with_delay(Duration::from_secs(3)));
        let token = CancellationToken::new();
        let source = source.with_cancellation(token.clone());

        let task = tokio::spawn(async move { source.columns_of("city").await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert_eq!(task.await.unwrap().unwrap_err(), SemanticError::Cancelled);
        assert!(cache.is_empty());
    }
}
