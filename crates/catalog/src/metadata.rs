// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! Tables and their ordered columns, as reported by a [`Catalog`](crate::Catalog).
//! Names keep the spelling the database uses; lookups elsewhere compare them
//! case-insensitively.

use serde::{Deserialize, Serialize};

/// Metadata for a database column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Type as the database spells it (`int(11)`, `char(3)`, ...)
    pub data_type: String,
    /// Whether the column is nullable
    pub nullable: bool,
    /// Whether this is a primary key column
    pub is_primary_key: bool,
    /// Column comment/description
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column metadata with builder pattern
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary_key: false,
            comment: None,
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: mark as primary key
    pub fn with_primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Metadata for a database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name
    pub name: String,
    /// Schema/database name
    pub schema: String,
    /// Column definitions in ordinal order
    pub columns: Vec<ColumnMetadata>,
    /// Table comment/description
    pub comment: Option<String>,
}

impl TableMetadata {
    /// Create new table metadata with builder pattern
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
            comment: None,
        }
    }

    /// Builder method: add columns
    pub fn with_columns(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.columns = columns;
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Get column by name, ignoring case
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.is_named(name))
    }
}
