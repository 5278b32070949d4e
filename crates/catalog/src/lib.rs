// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQLSight - Catalog Layer
//!
//! This crate provides database schema abstraction for the SQLSight server.
//! It defines the `Catalog` trait and the metadata types name resolution
//! consumes:
//!
//! - **Static Catalogs**: fixed schemas from configuration, plus the `world`
//!   sample database behind the `mock` driver
//! - **Live Catalogs**: `information_schema` lookups against MySQL (feature `mysql`)
//!
//! ## Metadata Types
//!
//! - [`TableMetadata`]: table name, schema and ordered columns
//! - [`ColumnMetadata`]: column name, raw type, nullability, key flag
//!
//! ## Implementing the Catalog Trait
//!
//! ```rust,ignore
//! use sqlsight_catalog::{Catalog, CatalogResult, ColumnMetadata, TableMetadata};
//! use async_trait::async_trait;
//!
//! struct MyCatalog;
//!
//! #[async_trait]
//! impl Catalog for MyCatalog {
//!     async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
//!         // Your implementation here
//!     }
//!
//!     async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
//!         // Your implementation here
//!     }
//! }
//! ```

pub mod error;
#[cfg(feature = "mysql")]
pub mod live_mysql;
pub mod metadata;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use error::{CatalogError, CatalogResult};
#[cfg(feature = "mysql")]
pub use live_mysql::LiveMySQLCatalog;
pub use metadata::{ColumnMetadata, TableMetadata};
pub use r#static::StaticCatalog;
pub use r#trait::Catalog;
