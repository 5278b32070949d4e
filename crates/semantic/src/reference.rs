// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Classified identifier references
//!
//! The position locator turns a cursor into a [`Located`] token. Its
//! [`Reference`] says what role the token plays, which decides the
//! resolution rule applied to it.

use serde::{Deserialize, Serialize};
use sqlsight_syntax::Span;

use crate::scope::ScopeId;

/// Right-hand side of a `qualifier.member` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Column(String),
    /// `qualifier.*`
    Wildcard,
}

/// Role of the token under the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    /// A FROM-clause table name or alias token
    TableName { scope_id: ScopeId, table_index: usize },
    /// Left-hand side of `qualifier.member`
    Qualifier { name: String },
    /// Right-hand side of `qualifier.member`
    Member { qualifier: String, member: Member },
    /// A bare identifier outside table position
    Column { name: String },
    /// Keywords, literals, punctuation
    Unresolvable,
}

/// A token found under the cursor, with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Located {
    /// Index into the document's token stream
    pub token: usize,
    pub span: Span,
    pub reference: Reference,
}
