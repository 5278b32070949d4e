// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Symbol types for semantic analysis
//!
//! [`TableRef`] is one entry of a FROM clause as seen by name resolution.
//! [`Symbol`] is what an identifier under the cursor resolves to.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeId;

/// Where the rows of a [`TableRef`] come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableOrigin {
    /// A catalog table; columns come from the catalog
    BaseTable,
    /// `(SELECT ...) alias`; columns come from the inner scope's projection
    DerivedSubquery { scope_id: ScopeId },
    /// A `WITH` binding; `column_names` renames the projection positionally
    CommonTable {
        scope_id: ScopeId,
        column_names: Vec<String>,
    },
}

/// A table visible in a scope
///
/// A table reference can be the actual table name or an alias (e.g., "ci" in
/// "FROM city ci").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Base table name, CTE name, or [`TableRef::DERIVED_MARKER`]
    pub canonical_name: String,

    /// Optional alias for the table (e.g., "ci" for "FROM city ci")
    pub alias: Option<String>,

    pub origin: TableOrigin,

    /// For derived tables: the single base table its projection reads from
    pub source_table: Option<String>,
}

impl TableRef {
    /// Canonical name given to derived tables
    pub const DERIVED_MARKER: &'static str = "<derived>";

    /// Create a reference to a catalog table
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlsight_semantic::TableRef;
    ///
    /// let table = TableRef::base("city").with_alias("ci");
    /// assert_eq!(table.canonical_name, "city");
    /// assert!(table.matches("CI"));
    /// ```
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            canonical_name: name.into(),
            alias: None,
            origin: TableOrigin::BaseTable,
            source_table: None,
        }
    }

    /// Create a reference to a parenthesized subquery built as `scope_id`
    pub fn derived(scope_id: ScopeId) -> Self {
        Self {
            canonical_name: Self::DERIVED_MARKER.to_string(),
            alias: None,
            origin: TableOrigin::DerivedSubquery { scope_id },
            source_table: None,
        }
    }

    /// Create a reference to a common table expression
    pub fn common_table(name: impl Into<String>, scope_id: ScopeId, column_names: Vec<String>) -> Self {
        Self {
            canonical_name: name.into(),
            alias: None,
            origin: TableOrigin::CommonTable {
                scope_id,
                column_names,
            },
            source_table: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_source_table(mut self, source_table: impl Into<String>) -> Self {
        self.source_table = Some(source_table.into());
        self
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.origin, TableOrigin::DerivedSubquery { .. })
    }

    /// Alias comparison, ignoring case
    pub fn matches_alias(&self, name: &str) -> bool {
        self.alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(name))
    }

    /// Canonical name comparison, ignoring case; never true for derived tables
    pub fn matches_name(&self, name: &str) -> bool {
        !self.is_derived() && self.canonical_name.eq_ignore_ascii_case(name)
    }

    /// True if `name` is this table's alias or canonical name
    pub fn matches(&self, name: &str) -> bool {
        self.matches_alias(name) || self.matches_name(name)
    }

    /// Name shown when this table is the hovered symbol
    ///
    /// Derived tables show their single source table, else their alias.
    pub fn display_name(&self) -> &str {
        if self.is_derived() {
            self.source_table
                .as_deref()
                .or(self.alias.as_deref())
                .unwrap_or(&self.canonical_name)
        } else {
            &self.canonical_name
        }
    }
}

/// A column as exposed by a [`TableRef`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Column name as the catalog (or the projection alias) spells it
    pub name: String,
    /// Base table that defines the column
    pub table_name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Outcome of resolving an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    NotFound,
    /// A bare column present in several visible tables
    Ambiguous(Vec<TableRef>),
    Table(TableRef),
    Column(TableRef, ColumnRef),
}

impl Symbol {
    pub fn is_found(&self) -> bool {
        matches!(self, Symbol::Table(_) | Symbol::Column(..))
    }
}
