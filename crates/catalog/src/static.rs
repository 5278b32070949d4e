// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! A catalog backed by an in-memory schema. It serves two connection drivers:
//!
//! - `static`: tables declared inline in the configuration
//! - `mock`: the MySQL `world` sample database, useful for trying the server
//!   without a running database
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlsight_catalog::{Catalog, StaticCatalog};
//!
//! let catalog = StaticCatalog::world();
//! let columns = catalog.get_columns("city").await?;
//! assert_eq!(columns[0].name, "ID");
//! ```

use async_trait::async_trait;
use std::collections::HashMap;

use crate::metadata::{ColumnMetadata, TableMetadata};
use crate::{Catalog, CatalogError, CatalogResult};

/// Catalog with a fixed set of tables
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    schema: String,
    /// Keyed by lowercase table name
    tables: HashMap<String, TableMetadata>,
}

impl StaticCatalog {
    /// Create an empty catalog for `schema`
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            tables: HashMap::new(),
        }
    }

    /// Builder method: add a table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.add_table(table);
        self
    }

    /// Add or replace a table
    pub fn add_table(&mut self, table: TableMetadata) {
        self.tables.insert(table.name.to_lowercase(), table);
    }

    /// Build a catalog from plain `table -> [column]` lists
    pub fn from_column_lists<I, C>(schema: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = (String, C)>,
        C: IntoIterator<Item = String>,
    {
        let mut catalog = Self::new(schema);
        for (name, columns) in tables {
            let columns = columns
                .into_iter()
                .map(|column| ColumnMetadata::new(column, ""))
                .collect();
            let table = TableMetadata::new(name, catalog.schema.clone()).with_columns(columns);
            catalog.add_table(table);
        }
        catalog
    }

    /// The MySQL `world` sample database
    pub fn world() -> Self {
        let city = TableMetadata::new("city", "world").with_columns(vec![
            ColumnMetadata::new("ID", "int(11)").with_primary_key(),
            ColumnMetadata::new("Name", "char(35)").with_nullable(false),
            ColumnMetadata::new("CountryCode", "char(3)").with_nullable(false),
            ColumnMetadata::new("District", "char(20)").with_nullable(false),
            ColumnMetadata::new("Population", "int(11)").with_nullable(false),
        ]);

        let country = TableMetadata::new("country", "world").with_columns(vec![
            ColumnMetadata::new("Code", "char(3)").with_primary_key(),
            ColumnMetadata::new("Name", "char(52)").with_nullable(false),
            ColumnMetadata::new("Continent", "enum").with_nullable(false),
            ColumnMetadata::new("Region", "char(26)").with_nullable(false),
            ColumnMetadata::new("SurfaceArea", "float(10,2)").with_nullable(false),
            ColumnMetadata::new("IndepYear", "smallint(6)"),
            ColumnMetadata::new("Population", "int(11)").with_nullable(false),
            ColumnMetadata::new("LifeExpectancy", "float(3,1)"),
            ColumnMetadata::new("GNP", "float(10,2)"),
            ColumnMetadata::new("GNPOld", "float(10,2)"),
            ColumnMetadata::new("LocalName", "char(45)").with_nullable(false),
            ColumnMetadata::new("GovernmentForm", "char(45)").with_nullable(false),
            ColumnMetadata::new("HeadOfState", "char(60)"),
            ColumnMetadata::new("Capital", "int(11)"),
            ColumnMetadata::new("Code2", "char(2)").with_nullable(false),
        ]);

        let countrylanguage = TableMetadata::new("countrylanguage", "world").with_columns(vec![
            ColumnMetadata::new("CountryCode", "char(3)").with_primary_key(),
            ColumnMetadata::new("Language", "char(30)").with_primary_key(),
            ColumnMetadata::new("IsOfficial", "enum('T','F')").with_nullable(false),
            ColumnMetadata::new("Percentage", "float(4,1)").with_nullable(false),
        ]);

        Self::new("world")
            .with_table(city)
            .with_table(country)
            .with_table(countrylanguage)
    }

    /// Schema name reported for every table
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Look up a table without going through the async trait
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(&name.to_lowercase())
    }

    /// All tables, in no particular order
    pub fn tables(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.values()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        let mut tables: Vec<_> = self.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.table(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string(), self.schema.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_world_schema() {
        let catalog = StaticCatalog::world();
        let tables = catalog.list_tables().await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["city", "country", "countrylanguage"]);

        let columns = catalog.get_columns("city").await.unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Name", "CountryCode", "District", "Population"]);
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let catalog = StaticCatalog::world();
        let columns = catalog.get_columns("CountryLanguage").await.unwrap();
        assert_eq!(columns.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let catalog = StaticCatalog::world();
        let err = catalog.get_columns("cities").await.unwrap_err();
        assert_eq!(err, CatalogError::TableNotFound("cities".to_string(), "world".to_string()));
    }

    #[tokio::test]
    async fn test_from_column_lists() {
        let catalog = StaticCatalog::from_column_lists(
            "app",
            vec![(
                "users".to_string(),
                vec!["id".to_string(), "email".to_string()],
            )],
        );
        let columns = catalog.get_columns("users").await.unwrap();
        assert_eq!(columns[1].name, "email");
        assert_eq!(catalog.schema(), "app");
        assert_eq!(catalog.table("USERS").map(|t| t.schema.as_str()), Some("app"));
        assert_eq!(catalog.tables().count(), 1);
    }
}
