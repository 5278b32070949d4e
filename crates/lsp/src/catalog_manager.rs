// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog manager
//!
//! Owns the catalog for the active connection.
//!
//! The catalog manager is responsible for:
//! - Creating the catalog for the configured connection
//! - Reusing it while the connection does not change
//! - Bumping the catalog *generation* whenever it is replaced, so column
//!   lists cached under the previous connection are discarded

use std::sync::Arc;
use std::time::Duration;

use sqlsight_catalog::{Catalog, CatalogResult, StaticCatalog};
use sqlsight_semantic::DEFAULT_QUERY_TIMEOUT;
use tracing::info;

use crate::config::{ConnectionConfig, Driver, EngineConfig};

/// Schema reported for inline tables without a `dbName`
const DEFAULT_STATIC_SCHEMA: &str = "main";

/// Catalog manager
pub struct CatalogManager {
    catalog: Arc<dyn Catalog>,
    /// Connection the current catalog was built from; `None` for the default
    connection: Option<ConnectionConfig>,
    generation: u64,
    query_timeout: Duration,
}

impl CatalogManager {
    /// Start with the built-in `world` schema
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(StaticCatalog::world()))
    }

    /// Start with an explicit catalog
    pub fn with_catalog(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            connection: None,
            generation: 0,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn catalog(&self) -> Arc<dyn Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Name of the active connection, if one is configured
    pub fn active_connection(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.display_name())
    }

    /// Bring the catalog in line with `config`
    ///
    /// The catalog is rebuilt only when the active connection differs from
    /// the one currently in use. Returns whether it was replaced. On error the
    /// previous catalog stays in place.
    pub async fn apply(&mut self, config: &EngineConfig) -> CatalogResult<bool> {
        self.query_timeout = config.query_timeout();

        let Some(connection) = config.active() else {
            return Ok(false);
        };
        if self.connection.as_ref() == Some(connection) {
            return Ok(false);
        }

        let catalog = connect(connection).await?;
        self.replace(catalog, Some(connection.clone()));
        info!(
            connection = connection.display_name(),
            generation = self.generation,
            "catalog switched"
        );
        Ok(true)
    }

    /// Swap in a catalog and move to the next generation
    pub fn replace(&mut self, catalog: Arc<dyn Catalog>, connection: Option<ConnectionConfig>) {
        self.catalog = catalog;
        self.connection = connection;
        self.generation += 1;
    }
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the catalog for one connection
async fn connect(connection: &ConnectionConfig) -> CatalogResult<Arc<dyn Catalog>> {
    match connection.driver {
        Driver::Mock => Ok(Arc::new(StaticCatalog::world())),
        Driver::Static => {
            let schema = if connection.db_name.is_empty() {
                DEFAULT_STATIC_SCHEMA
            } else {
                connection.db_name.as_str()
            };
            let tables = connection
                .tables
                .iter()
                .map(|(table, columns)| (table.clone(), columns.clone()));
            Ok(Arc::new(StaticCatalog::from_column_lists(schema, tables)))
        }
        Driver::Mysql => connect_mysql(connection).await,
    }
}

#[cfg(feature = "mysql")]
async fn connect_mysql(connection: &ConnectionConfig) -> CatalogResult<Arc<dyn Catalog>> {
    let catalog = sqlsight_catalog::LiveMySQLCatalog::new(&connection.data_source_name).await?;
    Ok(Arc::new(catalog))
}

#[cfg(not(feature = "mysql"))]
async fn connect_mysql(connection: &ConnectionConfig) -> CatalogResult<Arc<dyn Catalog>> {
    Err(sqlsight_catalog::CatalogError::NotSupported(format!(
        "connection '{}' needs the `mysql` feature",
        connection.display_name()
    )))
}
