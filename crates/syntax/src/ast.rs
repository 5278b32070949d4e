// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement outline
//!
//! The outline keeps exactly what name resolution needs and nothing more:
//! which tables each statement reads from, what its projection exposes, and
//! where nested queries sit. Expressions are not modelled. Their tokens stay
//! in [`ParsedSql::tokens`] and are classified on demand.
//!
//! Every [`Ident`] remembers the index of its token so that later layers can
//! map a cursor position back to the outline without re-scanning text.

use serde::{Deserialize, Serialize};

use crate::token::{Span, Token};

/// An identifier occurrence in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// Unquoted identifier text
    pub value: String,
    /// Index into [`ParsedSql::tokens`]
    pub token: usize,
    pub span: Span,
}

/// One entry in a statement's `FROM` list (or the target of `UPDATE`/`INSERT`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFactor {
    /// A named table, possibly schema-qualified: `world.city AS ci`
    Table {
        /// Name parts; the last one is the table name
        name: Vec<Ident>,
        alias: Option<Ident>,
    },
    /// A parenthesized subquery: `(SELECT ...) AS it`
    Derived {
        subquery: Box<Query>,
        alias: Option<Ident>,
    },
}

impl TableFactor {
    pub fn alias(&self) -> Option<&Ident> {
        match self {
            TableFactor::Table { alias, .. } | TableFactor::Derived { alias, .. } => alias.as_ref(),
        }
    }
}

/// One element of a projection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionItem {
    /// `col`, `t.col`, `schema.t.col`, each optionally aliased
    Column {
        qualifier: Option<Ident>,
        name: Ident,
        alias: Option<Ident>,
    },
    /// `*` or `t.*`
    Wildcard { qualifier: Option<Ident> },
    /// Any other expression; only its alias is observable from outside
    Expression { alias: Option<Ident> },
}

impl ProjectionItem {
    /// Name this item is visible under from an enclosing query
    pub fn output_name(&self) -> Option<&str> {
        match self {
            ProjectionItem::Column { alias: Some(alias), .. } => Some(&alias.value),
            ProjectionItem::Column { name, .. } => Some(&name.value),
            ProjectionItem::Expression { alias } => alias.as_ref().map(|a| a.value.as_str()),
            ProjectionItem::Wildcard { .. } => None,
        }
    }
}

/// Kind of statement an outline node was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// A single `SELECT` (or DML statement) and the tables it reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    /// From the statement keyword through its last token
    pub span: Span,
    pub projection: Vec<ProjectionItem>,
    /// Table sources in source order, joins flattened
    pub from: Vec<TableFactor>,
    /// Column list of `INSERT INTO t (a, b)`
    pub target_columns: Vec<Ident>,
    /// Nested queries appearing anywhere except the `FROM` list
    pub subqueries: Vec<Query>,
}

impl Statement {
    pub(crate) fn new(kind: StatementKind, span: Span) -> Self {
        Self {
            kind,
            span,
            projection: Vec::new(),
            from: Vec::new(),
            target_columns: Vec::new(),
            subqueries: Vec::new(),
        }
    }
}

/// `name [(columns)] AS (query)` inside a `WITH` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cte {
    pub name: Ident,
    pub columns: Vec<Ident>,
    pub query: Query,
}

/// A query expression: optional `WITH`, then one or more set-operation arms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub span: Span,
    pub ctes: Vec<Cte>,
    /// `UNION`/`INTERSECT`/`EXCEPT` arms; the first one names the output columns
    pub body: Vec<Statement>,
}

/// Tokens and outline of a whole document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedSql {
    pub tokens: Vec<Token>,
    /// Top-level statements in document order
    pub queries: Vec<Query>,
}
