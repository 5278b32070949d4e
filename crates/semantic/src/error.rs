// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! Failing to find a name is not an error: it resolves to
//! [`Symbol::NotFound`](crate::Symbol::NotFound). These errors describe
//! situations where resolution could not run to completion.

use sqlsight_catalog::CatalogError;
use thiserror::Error;

use crate::scope::ScopeId;

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Errors that can occur during identifier resolution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// The snapshot being resolved against was superseded or closed
    #[error("Resolution cancelled")]
    Cancelled,

    /// The catalog could not answer for a table (transient failure or timeout)
    #[error("Catalog unavailable for table '{table}': {source}")]
    CatalogUnavailable {
        table: String,
        #[source]
        source: CatalogError,
    },

    /// A scope id that does not exist in the scope tree
    #[error("Invalid scope reference: {0}")]
    InvalidScope(ScopeId),
}
