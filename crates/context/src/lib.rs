// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQLSight - Context Layer
//!
//! This crate connects the statement outline to the semantic layer.
//!
//! ## Overview
//!
//! - [`ScopeBuilder`] turns a [`ParsedSql`](sqlsight_syntax::ParsedSql)
//!   outline into a [`ScopeTree`](sqlsight_semantic::ScopeTree)
//! - [`locate`] finds the token under a cursor and [`classify`] decides
//!   whether it is a table, a qualifier, a member or a bare column
//!
//! ## Examples
//!
//! ```rust
//! use sqlsight_context::{ScopeBuilder, locate_reference};
//! use sqlsight_semantic::Reference;
//! use sqlsight_syntax::{Position, SqlDialect, parse};
//!
//! let parsed = parse("SELECT ci.Name FROM city AS ci", SqlDialect::MySQL).unwrap();
//! let tree = ScopeBuilder::build(&parsed);
//!
//! let located = locate_reference(&parsed, &tree, Position::new(0, 10)).unwrap();
//! assert!(matches!(located.reference, Reference::Member { ref qualifier, .. } if qualifier == "ci"));
//! ```

pub mod locator;
pub mod scope_builder;

// Re-export commonly used types
pub use locator::{classify, locate, locate_reference};
pub use scope_builder::ScopeBuilder;
