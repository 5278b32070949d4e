// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog implementation for testing
//!
//! An in-memory catalog that can also misbehave on request: fail for chosen
//! tables, answer slowly, and count how often it was asked.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlsight_catalog::{Catalog, CatalogError, CatalogResult, ColumnMetadata, StaticCatalog, TableMetadata};

/// In-memory mock catalog for testing
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    /// Keyed by lowercase table name
    tables: HashMap<String, TableMetadata>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    column_calls: Arc<AtomicUsize>,
}

impl MockCatalog {
    /// Create a new empty mock catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The MySQL `world` sample schema: city, country, countrylanguage
    pub fn world() -> Self {
        MockCatalogBuilder::new().with_world_schema().build()
    }

    /// Add a table to the catalog
    pub fn add_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table.name.to_lowercase(), table);
        self
    }

    /// Make `get_columns` fail with a transient error for `table`
    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing.insert(table.to_lowercase());
        self
    }

    /// Delay every `get_columns` answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get a table by name, ignoring case
    pub fn get_table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(&name.to_lowercase())
    }

    /// Number of `get_columns` calls so far, shared between clones
    pub fn column_calls(&self) -> usize {
        self.column_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Catalog for MockCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        let mut tables: Vec<_> = self.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&table.to_lowercase()) {
            return Err(CatalogError::ConnectionFailed(format!(
                "mock connection lost while reading '{}'",
                table
            )));
        }

        if let Some(table_metadata) = self.get_table(table) {
            Ok(table_metadata.columns.clone())
        } else {
            Err(CatalogError::TableNotFound(table.to_string(), "mock".to_string()))
        }
    }
}

/// Builder for creating mock catalogs with a fluent API
#[derive(Default)]
pub struct MockCatalogBuilder {
    catalog: MockCatalog,
}

impl MockCatalogBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the `world` sample schema
    pub fn with_world_schema(mut self) -> Self {
        for table in world_tables() {
            self.catalog = self.catalog.add_table(table);
        }
        self
    }

    /// Add a table given only its column names
    pub fn with_columns(mut self, table: &str, columns: &[&str]) -> Self {
        let columns = columns.iter().map(|c| ColumnMetadata::new(*c, "")).collect();
        self.catalog = self
            .catalog
            .add_table(TableMetadata::new(table, "mock").with_columns(columns));
        self
    }

    /// Add a custom table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.catalog = self.catalog.add_table(table);
        self
    }

    /// Build the mock catalog
    pub fn build(self) -> MockCatalog {
        self.catalog
    }
}

/// Tables of the `world` schema, as the static catalog serves them
fn world_tables() -> Vec<TableMetadata> {
    let mut tables: Vec<_> = StaticCatalog::world().tables().cloned().collect();
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_catalog_list_tables() {
        let catalog = MockCatalog::world();

        let tables = catalog.list_tables().await.unwrap();
        let table_names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(table_names, vec!["city", "country", "countrylanguage"]);
    }

    #[tokio::test]
    async fn test_mock_catalog_get_columns() {
        let catalog = MockCatalog::world();

        let columns = catalog.get_columns("City").await.unwrap();
        let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(column_names, vec!["ID", "Name", "CountryCode", "District", "Population"]);
        assert_eq!(catalog.column_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_transient() {
        let catalog = MockCatalog::world();
        let err = catalog.get_columns("cities").await.unwrap_err();
        assert!(matches!(err, CatalogError::TableNotFound(..)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_failing_table() {
        let catalog = MockCatalog::world().with_failing_table("country");
        assert!(catalog.get_columns("city").await.is_ok());

        let err = catalog.get_columns("COUNTRY").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(catalog.column_calls(), 2);
    }

    #[tokio::test]
    async fn test_builder_with_columns() {
        let catalog = MockCatalogBuilder::new()
            .with_columns("users", &["id", "email"])
            .build();
        let columns = catalog.get_columns("users").await.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].name, "email");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_uses_tokio_time() {
        let catalog = MockCatalog::world().with_delay(Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        catalog.get_columns("city").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}
