// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Scope management for semantic analysis
//!
//! One [`Scope`] per statement level: each `SELECT` arm, each subquery, each
//! derived table and each CTE body. A scope only sees the tables its own
//! FROM clause introduces. Parent links are kept for navigation, but name
//! lookup never walks them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlsight_syntax::{Position, Span};

use crate::symbol::{TableOrigin, TableRef};

/// Index of a scope inside its [`ScopeTree`]
pub type ScopeId = usize;

/// Type of scope in a SQL query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Top-level statement (or one arm of a top-level set operation)
    Query,
    /// Subquery outside the FROM clause (`IN (...)`, `EXISTS (...)`, scalar)
    Subquery,
    /// Parenthesized subquery in a FROM clause
    Derived,
    /// Body of a common table expression
    Cte,
}

/// One projection item, as far as enclosing scopes can observe it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionColumn {
    /// `col`, `t.col`, optionally aliased
    Column {
        qualifier: Option<String>,
        name: String,
        alias: Option<String>,
    },
    /// An aliased expression
    Expression { alias: String },
    /// `*` or `t.*`
    Wildcard { qualifier: Option<String> },
}

/// A lexical scope: the tables one statement's FROM clause introduces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent_id: Option<ScopeId>,
    /// Text covered by the owning statement
    pub span: Span,
    /// Tables in FROM-clause order
    pub tables: Vec<TableRef>,
    /// Output of the owning statement
    pub projection: Vec<ProjectionColumn>,
}

impl Scope {
    pub fn new(id: ScopeId, kind: ScopeKind, span: Span) -> Self {
        Self {
            id,
            kind,
            parent_id: None,
            span,
            tables: Vec::new(),
            projection: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: ScopeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Find a table by alias first, then by canonical name
    ///
    /// Duplicates resolve to their first occurrence.
    pub fn find_table(&self, name: &str) -> Option<&TableRef> {
        self.tables
            .iter()
            .find(|t| t.matches_alias(name))
            .or_else(|| self.tables.iter().find(|t| t.matches_name(name)))
    }

    /// Base table every projected column reads from, if there is exactly one
    ///
    /// Decided syntactically: qualified items name their table, unqualified
    /// items count only when the scope has a single table. Aliased
    /// expressions are ignored.
    pub fn single_source_table(&self) -> Option<String> {
        let mut source: Option<&str> = None;
        for item in &self.projection {
            let qualifier = match item {
                ProjectionColumn::Column { qualifier, .. } | ProjectionColumn::Wildcard { qualifier } => {
                    qualifier.as_deref()
                }
                ProjectionColumn::Expression { .. } => continue,
            };
            let table = match qualifier {
                Some(q) => self.find_table(q)?,
                None if self.tables.len() == 1 => &self.tables[0],
                None => return None,
            };
            let name = match &table.origin {
                TableOrigin::DerivedSubquery { .. } => table.source_table.as_deref()?,
                _ => table.canonical_name.as_str(),
            };
            match source {
                Some(existing) if !existing.eq_ignore_ascii_case(name) => return None,
                Some(_) => {}
                None => source = Some(name),
            }
        }
        source.map(str::to_string)
    }
}

/// All scopes of one document version
///
/// Scopes are stored in creation order. A child is always created after its
/// parent and sibling spans never overlap, so the last-created scope
/// containing a position is the innermost one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    /// FROM-clause table name and alias tokens -> (scope, table index)
    table_tokens: HashMap<usize, (ScopeId, usize)>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope and return its id
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlsight_semantic::{ScopeKind, ScopeTree};
    /// use sqlsight_syntax::Span;
    ///
    /// let mut tree = ScopeTree::new();
    /// let parent = tree.create_scope(ScopeKind::Query, None, Span::default());
    /// let child = tree.create_scope(ScopeKind::Derived, Some(parent), Span::default());
    /// assert!(child > parent);
    /// assert_eq!(tree.get_scope(child).unwrap().parent_id, Some(parent));
    /// ```
    pub fn create_scope(&mut self, kind: ScopeKind, parent_id: Option<ScopeId>, span: Span) -> ScopeId {
        let id = self.scopes.len();
        let mut scope = Scope::new(id, kind, span);
        if let Some(parent) = parent_id {
            scope = scope.with_parent(parent);
        }
        self.scopes.push(scope);
        id
    }

    pub fn get_scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    pub fn get_scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id)
    }

    /// Append a table to a scope, recording the tokens that introduced it
    ///
    /// Returns the table's index within the scope.
    pub fn add_table(&mut self, scope_id: ScopeId, table: TableRef, tokens: &[usize]) -> Option<usize> {
        let scope = self.scopes.get_mut(scope_id)?;
        let index = scope.tables.len();
        scope.tables.push(table);
        for token in tokens {
            self.table_tokens.insert(*token, (scope_id, index));
        }
        Some(index)
    }

    /// Scope and table index for a FROM-clause name or alias token
    pub fn table_at_token(&self, token: usize) -> Option<(ScopeId, usize)> {
        self.table_tokens.get(&token).copied()
    }

    /// Innermost scope whose span contains `position`
    pub fn innermost_scope_at(&self, position: Position) -> Option<&Scope> {
        self.scopes.iter().rev().find(|s| s.span.contains(position))
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
