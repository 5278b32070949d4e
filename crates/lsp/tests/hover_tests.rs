// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! HoverEngine integration tests
//!
//! Drives hover through published snapshots, the way the backend does.

use std::sync::Arc;
use std::time::Duration;

use sqlsight_lsp::{CatalogManager, HoverEngine, Snapshot, SnapshotStore};
use sqlsight_syntax::SqlDialect;
use sqlsight_test_utils::{MockCatalog, MockCatalogBuilder, split_cursor, world_hover_cases};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tower_lsp::lsp_types::Url;

struct Harness {
    engine: Arc<HoverEngine>,
    snapshots: Arc<SnapshotStore>,
    catalogs: Arc<RwLock<CatalogManager>>,
    uri: Url,
}

impl Harness {
    fn new(catalog: MockCatalog) -> Self {
        let snapshots = Arc::new(SnapshotStore::new());
        let catalogs = Arc::new(RwLock::new(CatalogManager::with_catalog(Arc::new(catalog))));
        let engine = Arc::new(HoverEngine::new(Arc::clone(&snapshots), Arc::clone(&catalogs)));
        Self {
            engine,
            snapshots,
            catalogs,
            uri: Url::parse("file:///world.sql").unwrap(),
        }
    }

    async fn open(&self, version: i32, text: &str, dialect: SqlDialect) {
        let snapshot = Snapshot::build(self.uri.clone(), version, text.to_string(), dialect);
        assert!(self.snapshots.publish(snapshot).await);
    }

    async fn hover(&self, line: u32, column: u32) -> String {
        self.engine
            .hover_at(&self.uri, None, line, column)
            .await
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn test_world_cases_through_snapshots() {
    let harness = Harness::new(MockCatalog::world());
    let mut version = 0;

    for case in world_hover_cases().unwrap() {
        version += 1;
        let dialect = case.dialect.unwrap_or(SqlDialect::MySQL);
        harness.open(version, &case.sql, dialect).await;
        assert_eq!(
            harness.hover(case.line, case.column).await,
            case.expected,
            "{}: {}",
            case.description,
            case.sql
        );
    }
}

#[tokio::test]
async fn test_column_lists_are_cached_per_snapshot() {
    let catalog = MockCatalog::world();
    let harness = Harness::new(catalog.clone());
    harness.open(1, "SELECT ci.ID, ci.Name FROM city ci", SqlDialect::MySQL).await;

    assert_eq!(harness.hover(0, 10).await, "city.ID column");
    assert_eq!(harness.hover(0, 18).await, "city.Name column");
    assert_eq!(catalog.column_calls(), 1);

    // A new version starts with an empty cache
    harness.open(2, "SELECT ci.ID, ci.Name FROM city ci", SqlDialect::MySQL).await;
    assert_eq!(harness.hover(0, 10).await, "city.ID column");
    assert_eq!(catalog.column_calls(), 2);
}

#[tokio::test]
async fn test_unknown_table_is_not_refetched() {
    let catalog = MockCatalog::world();
    let harness = Harness::new(catalog.clone());
    harness.open(1, "SELECT c.ID, c.Name FROM cities c", SqlDialect::MySQL).await;

    assert_eq!(harness.hover(0, 9).await, "");
    assert_eq!(harness.hover(0, 15).await, "");
    assert_eq!(harness.hover(0, 7).await, "cities table");
    assert_eq!(catalog.column_calls(), 1);
}

#[tokio::test]
async fn test_catalog_switch_refetches_columns() {
    let harness = Harness::new(MockCatalog::world());
    harness.open(1, "SELECT ci.Name FROM city ci", SqlDialect::MySQL).await;
    assert_eq!(harness.hover(0, 11).await, "city.Name column");

    let renamed = MockCatalogBuilder::new()
        .with_columns("city", &["ID", "Label"])
        .build();
    harness.catalogs.write().await.replace(Arc::new(renamed), None);

    // Same snapshot, new generation: the old column list is discarded
    assert_eq!(harness.hover(0, 11).await, "");
    assert_eq!(harness.hover(0, 7).await, "city table");
}

#[tokio::test]
async fn test_catalog_outage_degrades_to_no_hover() {
    let harness = Harness::new(MockCatalog::world().with_failing_table("city"));
    harness
        .open(1, "SELECT ci.Name, co.Name FROM city ci, country co", SqlDialect::MySQL)
        .await;

    assert_eq!(harness.hover(0, 11).await, "");
    assert_eq!(harness.hover(0, 19).await, "country.Name column");
}

#[tokio::test]
async fn test_slow_catalog_times_out() {
    let harness = Harness::new(MockCatalog::world().with_delay(Duration::from_secs(30)));
    let config = sqlsight_lsp::EngineConfig {
        query_timeout_secs: 1,
        ..Default::default()
    };
    harness.catalogs.write().await.apply(&config).await.unwrap();
    harness.open(1, "SELECT ci.Name FROM city ci", SqlDialect::MySQL).await;

    let started = std::time::Instant::now();
    assert_eq!(harness.hover(0, 11).await, "");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_closing_document_cancels_inflight_hover() {
    let harness = Harness::new(MockCatalog::world().with_delay(Duration::from_secs(30)));
    harness.open(1, "SELECT ci.Name FROM city ci", SqlDialect::MySQL).await;

    let engine = Arc::clone(&harness.engine);
    let uri = harness.uri.clone();
    let pending = tokio::spawn(async move { engine.hover_at(&uri, None, 0, 11).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.snapshots.remove(&harness.uri).await);

    let result = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("hover should stop once cancelled")
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_hover_pinned_to_superseded_version_is_empty() {
    let harness = Harness::new(MockCatalog::world());
    harness.open(1, "SELECT Name FROM city", SqlDialect::MySQL).await;
    harness.open(2, "SELECT Name FROM country", SqlDialect::MySQL).await;

    assert_eq!(harness.engine.hover_at(&harness.uri, Some(1), 0, 8).await, None);
    assert_eq!(
        harness.engine.hover_at(&harness.uri, Some(2), 0, 8).await.as_deref(),
        Some("country.Name column")
    );
}

#[tokio::test]
async fn test_postgres_quoted_identifiers() {
    let harness = Harness::new(MockCatalog::world());
    let (sql, line, column) = split_cursor("SELECT \"co\".\"Cont|inent\" FROM country AS \"co\"").unwrap();
    harness.open(1, &sql, SqlDialect::PostgreSQL).await;
    assert_eq!(harness.hover(line, column).await, "country.Continent column");
}

#[tokio::test]
async fn test_repeated_hover_is_stable() {
    let catalog = MockCatalog::world();
    let harness = Harness::new(catalog.clone());
    harness
        .open(
            1,
            "SELECT it.ID, it.Name FROM (SELECT ci.ID, ci.Name, ci.CountryCode, ci.District, ci.Population FROM city AS ci) as it",
            SqlDialect::MySQL,
        )
        .await;

    for _ in 0..3 {
        assert_eq!(harness.hover(0, 20).await, "city.Name column");
        assert_eq!(
            harness.engine.hover_at(&harness.uri, Some(1), 0, 20).await.as_deref(),
            Some("city.Name column")
        );
        assert_eq!(harness.hover(0, 15).await, "city table");
    }
    assert_eq!(catalog.column_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hovers_on_one_snapshot() {
    let harness = Harness::new(MockCatalog::world().with_delay(Duration::from_millis(5)));
    harness
        .open(
            1,
            "SELECT ci.Name, co.Continent FROM city ci JOIN country co ON ci.CountryCode = co.Code",
            SqlDialect::MySQL,
        )
        .await;
    let published = harness.snapshots.get(&harness.uri).await.unwrap();

    let expected = [
        (10, "city.Name column"),
        (16, "country table"),
        (20, "country.Continent column"),
        (35, "city table"),
        (66, "city.CountryCode column"),
        (83, "country.Code column"),
    ];

    let mut tasks = JoinSet::new();
    for round in 0..48 {
        let (column, text) = expected[round % expected.len()];
        let engine = Arc::clone(&harness.engine);
        let uri = harness.uri.clone();
        tasks.spawn(async move { (engine.hover_at(&uri, None, 0, column).await, text) });
    }

    let mut finished = 0;
    while let Some(joined) = tasks.join_next().await {
        let (hover, text) = joined.unwrap();
        assert_eq!(hover.as_deref(), Some(text));
        finished += 1;
    }
    assert_eq!(finished, 48);

    let current = harness.snapshots.get(&harness.uri).await.unwrap();
    assert!(Arc::ptr_eq(&published, &current));
}
