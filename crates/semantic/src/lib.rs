// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQLSight - Semantic Analysis Layer
//!
//! Scopes, symbols and identifier resolution.
//!
//! ## Overview
//!
//! Semantic analysis sits between the outline parser and the server:
//! - **Scope management**: one [`Scope`] per statement level, collected in a [`ScopeTree`]
//! - **Symbol resolution**: a [`Located`] token resolves to a [`Symbol`] through the [`Resolver`]
//! - **Column lookup**: catalog columns fetched lazily into a [`ColumnCache`]
//! - **Hover text**: [`format_hover`]
//!
//! ## Core Concepts
//!
//! ### Scopes
//!
//! A scope holds the tables introduced by one statement's FROM clause. Unlike
//! most SQL engines, an inner scope does *not* see its parents' tables, so
//! correlated references from a subquery resolve to nothing.
//!
//! ```rust
//! use sqlsight_semantic::{ScopeKind, ScopeTree, TableRef};
//! use sqlsight_syntax::{Position, Span};
//!
//! let mut tree = ScopeTree::new();
//! let span = Span::new(Position::new(0, 0), Position::new(0, 40));
//! let scope = tree.create_scope(ScopeKind::Query, None, span);
//! tree.add_table(scope, TableRef::base("city").with_alias("ci"), &[]);
//!
//! let active = tree.innermost_scope_at(Position::new(0, 10)).unwrap();
//! assert_eq!(active.find_table("CI").unwrap().canonical_name, "city");
//! ```
//!
//! ### Symbols
//!
//! [`Symbol`] is a closed set of outcomes. `NotFound` and `Ambiguous` are
//! ordinary values; [`SemanticError`] is reserved for resolutions that could
//! not finish (cancellation, an inconsistent scope tree).

pub mod column_cache;
pub mod error;
pub mod hover;
pub mod reference;
pub mod resolver;
pub mod scope;
pub mod symbol;

// Re-export commonly used types
pub use column_cache::{ColumnCache, ColumnSource, ColumnState, DEFAULT_QUERY_TIMEOUT};
pub use error::{SemanticError, SemanticResult};
pub use hover::format_hover;
pub use reference::{Located, Member, Reference};
pub use resolver::Resolver;
pub use scope::{ProjectionColumn, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{ColumnRef, Symbol, TableOrigin, TableRef};
