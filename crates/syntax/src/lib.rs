// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQLSight - Syntax Layer
//!
//! This crate turns SQL text into the two structures every other layer works on:
//!
//! - **Tokens**: a positioned token stream with whitespace and comments removed
//! - **Outline**: a lightweight statement tree recording, for every `SELECT`,
//!   `INSERT`, `UPDATE` and `DELETE`, its projection list, its table sources and
//!   its nested subqueries
//!
//! ## Architecture
//!
//! ```text
//! SQL text ──▶ sqlparser Tokenizer ──▶ Vec<Token> ──▶ OutlineParser ──▶ ParsedSql
//! ```
//!
//! The outline parser never fails on structure. Incomplete statements (the
//! normal state of a document being edited) produce partial outlines. Only a
//! tokenizer failure, such as an unterminated string literal, is reported as
//! a [`SyntaxError`].
//!
//! ## Coordinates
//!
//! Every [`Position`] is zero-based in both line and column. Columns count
//! characters, not bytes. A [`Span`] is half-open: `start` is the first
//! character of the token and `end` is one past its last character.
//!
//! ## Example
//!
//! ```rust
//! use sqlsight_syntax::{parse, SqlDialect, TableFactor};
//!
//! let parsed = parse("SELECT ci.ID FROM city AS ci", SqlDialect::MySQL).unwrap();
//! let select = &parsed.queries[0].body[0];
//! match &select.from[0] {
//!     TableFactor::Table { name, alias } => {
//!         assert_eq!(name.last().unwrap().value, "city");
//!         assert_eq!(alias.as_ref().unwrap().value, "ci");
//!     }
//!     TableFactor::Derived { .. } => unreachable!(),
//! }
//! ```

pub mod ast;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod token;

pub use ast::{
    Cte, Ident, ParsedSql, ProjectionItem, Query, Statement, StatementKind, TableFactor,
};
pub use dialect::SqlDialect;
pub use error::{SyntaxError, SyntaxResult};
pub use parser::parse;
pub use token::{Position, Span, Token, TokenKind, tokenize};
