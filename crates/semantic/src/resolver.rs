// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Identifier resolution
//!
//! Resolves a [`Located`] token against the scope active at its position.
//!
//! ## Rules
//!
//! | Reference | Lookup | Result |
//! |-----------|--------|--------|
//! | FROM-clause name or alias | the table it introduced | `Table` |
//! | `q` in `q.x` | alias, then canonical name | `Table` or `NotFound` |
//! | `x` in `q.x` | `x` among `q`'s columns | `Column` or `NotFound` |
//! | `*` in `q.*` | `q` | `Table` |
//! | bare `x` | every table of the scope | `NotFound`, `Column` or `Ambiguous` |
//!
//! Only the innermost scope containing the token is consulted. Columns of
//! derived tables and CTEs are the inner statement's projection, and a
//! column reached through one reports the base table that defines it.
//! Each projection is computed once per resolver.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;

use sqlsight_syntax::Position;

use crate::column_cache::ColumnSource;
use crate::error::{SemanticError, SemanticResult};
use crate::reference::{Located, Member, Reference};
use crate::scope::{ProjectionColumn, Scope, ScopeId, ScopeTree};
use crate::symbol::{ColumnRef, Symbol, TableOrigin, TableRef};

type Columns = Arc<Vec<ColumnRef>>;
type ColumnsFuture<'a> = Pin<Box<dyn Future<Output = SemanticResult<Columns>> + Send + 'a>>;

/// Resolves identifiers of one snapshot
pub struct Resolver<'a> {
    tree: &'a ScopeTree,
    columns: &'a ColumnSource,
    /// Output columns of derived and CTE scopes already computed
    projections: Mutex<HashMap<ScopeId, Columns>>,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ScopeTree, columns: &'a ColumnSource) -> Self {
        Self {
            tree,
            columns,
            projections: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the token under the cursor
    ///
    /// # Errors
    ///
    /// Returns `SemanticError::Cancelled` when the snapshot is cancelled
    /// mid-resolution. Catalog failures never surface here; the affected
    /// table simply contributes no columns.
    pub async fn resolve(&self, located: &Located) -> SemanticResult<Symbol> {
        let scope = match &located.reference {
            Reference::Unresolvable => return Ok(Symbol::NotFound),
            Reference::TableName {
                scope_id,
                table_index,
            } => {
                let table = self
                    .tree
                    .get_scope(*scope_id)
                    .and_then(|s| s.tables.get(*table_index));
                return Ok(table.map_or(Symbol::NotFound, |t| Symbol::Table(t.clone())));
            }
            _ => match self.tree.innermost_scope_at(located.span.start) {
                Some(scope) => scope,
                None => return Ok(Symbol::NotFound),
            },
        };

        let symbol = match &located.reference {
            Reference::Qualifier { name } => scope
                .find_table(name)
                .map_or(Symbol::NotFound, |t| Symbol::Table(t.clone())),
            Reference::Member { qualifier, member } => match scope.find_table(qualifier) {
                None => Symbol::NotFound,
                Some(table) => match member {
                    Member::Wildcard => Symbol::Table(table.clone()),
                    Member::Column(name) => self
                        .table_columns(table)
                        .await?
                        .iter()
                        .find(|c| c.is_named(name))
                        .map_or(Symbol::NotFound, |c| Symbol::Column(table.clone(), c.clone())),
                },
            },
            Reference::Column { name } => self.resolve_bare_column(scope, name).await?,
            Reference::TableName { .. } | Reference::Unresolvable => Symbol::NotFound,
        };

        tracing::trace!(scope = scope.id, ?symbol, "resolved identifier");
        Ok(symbol)
    }

    async fn resolve_bare_column(&self, scope: &Scope, name: &str) -> SemanticResult<Symbol> {
        let mut matches = Vec::new();
        for table in &scope.tables {
            let columns = self.table_columns(table).await?;
            if let Some(column) = columns.iter().find(|c| c.is_named(name)) {
                matches.push((table, column.clone()));
            }
        }

        Ok(match matches.len() {
            0 => Symbol::NotFound,
            1 => {
                let (table, column) = matches.remove(0);
                Symbol::Column(table.clone(), column)
            }
            _ => Symbol::Ambiguous(matches.into_iter().map(|(t, _)| t.clone()).collect()),
        })
    }

    /// Tables visible at `position`, in FROM-clause order
    pub fn visible_tables(&self, position: Position) -> Vec<TableRef> {
        self.tree
            .innermost_scope_at(position)
            .map(|s| s.tables.clone())
            .unwrap_or_default()
    }

    /// Every column a bare identifier at `position` could name
    pub async fn candidate_columns(&self, position: Position) -> SemanticResult<Vec<ColumnRef>> {
        let Some(scope) = self.tree.innermost_scope_at(position) else {
            return Ok(Vec::new());
        };
        let mut candidates = Vec::new();
        for table in &scope.tables {
            candidates.extend(self.table_columns(table).await?.iter().cloned());
        }
        Ok(candidates)
    }

    /// Columns exposed by a table reference
    ///
    /// Recursive through derived tables and CTEs, hence the boxed future.
    fn table_columns<'b>(&'b self, table: &'b TableRef) -> ColumnsFuture<'b> {
        Box::pin(async move {
            match &table.origin {
                TableOrigin::BaseTable => self.base_table_columns(&table.canonical_name).await,
                TableOrigin::DerivedSubquery { scope_id } => {
                    self.projected_columns(*scope_id, table, &[]).await
                }
                TableOrigin::CommonTable {
                    scope_id,
                    column_names,
                } => self.projected_columns(*scope_id, table, column_names).await,
            }
        })
    }

    async fn base_table_columns(&self, name: &str) -> SemanticResult<Columns> {
        match self.columns.columns_of(name).await {
            Ok(Some(columns)) => Ok(Arc::new(columns.iter().map(|c| ColumnRef::new(&c.name, name)).collect())),
            Ok(None) => Ok(Arc::default()),
            Err(SemanticError::CatalogUnavailable { table, source }) => {
                tracing::warn!(%table, error = %source, "catalog unavailable, treating table as empty");
                Ok(Arc::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Output columns of the statement built as `scope_id`, memoized
    async fn projected_columns(
        &self,
        scope_id: ScopeId,
        owner: &TableRef,
        renames: &[String],
    ) -> SemanticResult<Columns> {
        if let Some(columns) = self.projections.lock().get(&scope_id) {
            return Ok(Arc::clone(columns));
        }

        let columns = Arc::new(self.compute_projection(scope_id, owner, renames).await?);
        self.projections.lock().insert(scope_id, Arc::clone(&columns));
        Ok(columns)
    }

    async fn compute_projection(
        &self,
        scope_id: ScopeId,
        owner: &TableRef,
        renames: &[String],
    ) -> SemanticResult<Vec<ColumnRef>> {
        let inner = self
            .tree
            .get_scope(scope_id)
            .ok_or(SemanticError::InvalidScope(scope_id))?;

        let mut output = Vec::new();
        for item in &inner.projection {
            match item {
                ProjectionColumn::Column {
                    qualifier,
                    name,
                    alias,
                } => {
                    let defined = self.defining_column(inner, qualifier.as_deref(), name).await?;
                    let table_name = match &defined {
                        Some(column) => column.table_name.clone(),
                        None => self.fallback_table(inner, qualifier.as_deref(), owner),
                    };
                    let column_name = alias
                        .clone()
                        .or_else(|| defined.map(|c| c.name))
                        .unwrap_or_else(|| name.clone());
                    output.push(ColumnRef::new(column_name, table_name));
                }
                ProjectionColumn::Expression { alias } => {
                    output.push(ColumnRef::new(alias, owner.display_name()));
                }
                ProjectionColumn::Wildcard { qualifier: Some(q) } => {
                    if let Some(table) = inner.find_table(q) {
                        output.extend(self.table_columns(table).await?.iter().cloned());
                    }
                }
                ProjectionColumn::Wildcard { qualifier: None } => {
                    for table in &inner.tables {
                        output.extend(self.table_columns(table).await?.iter().cloned());
                    }
                }
            }
        }

        for (column, rename) in output.iter_mut().zip(renames) {
            column.name = rename.clone();
        }
        // Unaliased expressions only hold a position for the renames above
        output.retain(|c| !c.name.is_empty());
        Ok(output)
    }

    /// The column a projection item reads, when exactly one inner table has it
    async fn defining_column(
        &self,
        inner: &Scope,
        qualifier: Option<&str>,
        name: &str,
    ) -> SemanticResult<Option<ColumnRef>> {
        let candidates: Vec<&TableRef> = match qualifier {
            Some(q) => inner.find_table(q).into_iter().collect(),
            None => inner.tables.iter().collect(),
        };

        let mut found = None;
        for table in candidates {
            let columns = self.table_columns(table).await?;
            if let Some(column) = columns.iter().find(|c| c.is_named(name)) {
                if found.is_some() {
                    return Ok(None);
                }
                found = Some(column.clone());
            }
        }
        Ok(found)
    }

    /// Table to attribute a projected column to when no catalog knows it
    fn fallback_table(&self, inner: &Scope, qualifier: Option<&str>, owner: &TableRef) -> String {
        let table = match qualifier {
            Some(q) => inner.find_table(q),
            None if inner.tables.len() == 1 => inner.tables.first(),
            None => None,
        };
        table.map_or(owner.display_name(), |t| t.display_name()).to_string()
    }
}
