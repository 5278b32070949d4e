// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait for database schema abstraction
//!
//! This module defines the async Catalog trait used for querying database schema information.

use crate::error::CatalogResult;
use crate::metadata::{ColumnMetadata, TableMetadata};

/// Catalog trait for database schema abstraction
///
/// Implementations can connect to live databases or serve a fixed schema.
/// Both methods may be slow; callers bound them with a timeout.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlsight_catalog::{Catalog, CatalogError};
///
/// async fn column_names(catalog: &dyn Catalog, table: &str) -> Result<Vec<String>, CatalogError> {
///     let columns = catalog.get_columns(table).await?;
///     Ok(columns.into_iter().map(|c| c.name).collect())
/// }
/// ```
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// List all tables in the current schema
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ConnectionFailed` if the database is unreachable.
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>>;

    /// Get column metadata for a specific table, in ordinal order
    ///
    /// Table names are matched case-insensitively. An empty vector means the
    /// table exists but its columns are not known.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if the table doesn't exist.
    /// Returns `CatalogError::QueryFailed` if the lookup itself failed.
    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>>;
}
