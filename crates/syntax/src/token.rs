// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Positioned tokens
//!
//! Wraps the sqlparser tokenizer and converts its one-based locations into
//! zero-based [`Position`]s. Whitespace and comments are dropped, so token
//! indices in the returned vector are dense and stable for the lifetime of a
//! document version.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlparser::tokenizer::{Location, Token as SqlToken, Tokenizer};

use crate::dialect::SqlDialect;
use crate::error::{SyntaxError, SyntaxResult};

/// Zero-based line/column pair, column counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    fn from_location(location: Location) -> Self {
        Self {
            line: location.line.saturating_sub(1) as u32,
            column: location.column.saturating_sub(1) as u32,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// True when the character at `position` belongs to this span
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// Smallest span covering both `self` and `other`
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Coarse token classification used by the outline parser and the locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Structural keyword (`SELECT`, `FROM`, `JOIN`, ...)
    Keyword,
    /// Unquoted identifier, including words that are only soft keywords
    Identifier,
    /// Identifier written with quotes or backticks
    QuotedIdentifier,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `*`
    Star,
    /// `;`
    Semicolon,
    /// Numeric or string literal
    Literal,
    /// Anything else (operators, placeholders, ...)
    Operator,
}

impl TokenKind {
    /// True for plain and quoted identifiers
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::QuotedIdentifier)
    }
}

/// A single positioned token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text; identifier quotes are stripped
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Case-insensitive keyword test
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(keyword)
    }

    /// True if this token is any of the given keywords
    pub fn is_any_keyword(&self, keywords: &[&str]) -> bool {
        self.kind == TokenKind::Keyword && keywords.iter().any(|k| self.text.eq_ignore_ascii_case(k))
    }
}

/// Words that shape statement structure
///
/// Everything else, including words sqlparser treats as keywords such as
/// `NAME` or `LANGUAGE`, is an identifier here. Schema objects are routinely
/// named after soft keywords.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "BY", "HAVING", "ORDER", "LIMIT", "OFFSET", "JOIN",
    "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "STRAIGHT_JOIN", "ON",
    "USING", "AS", "AND", "OR", "NOT", "UNION", "INTERSECT", "EXCEPT", "MINUS", "ALL",
    "DISTINCT", "IN", "IS", "NULL", "LIKE", "BETWEEN", "EXISTS", "CASE", "WHEN", "THEN", "ELSE",
    "END", "WITH", "RECURSIVE", "INSERT", "REPLACE", "UPDATE", "DELETE", "SET", "INTO",
    "VALUES", "ASC", "DESC", "TRUE", "FALSE", "LATERAL", "WINDOW", "RETURNING", "FOR",
];

fn is_structural(word: &str) -> bool {
    STRUCTURAL_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Tokenize `sql` into positioned, non-whitespace tokens
pub fn tokenize(sql: &str, dialect: SqlDialect) -> SyntaxResult<Vec<Token>> {
    let lexer = dialect.lexer();
    let raw = Tokenizer::new(lexer.as_ref(), sql)
        .tokenize_with_location()
        .map_err(|err| SyntaxError::Tokenize {
            message: err.message.clone(),
            position: Position::from_location(err.location),
        })?;

    let mut tokens = Vec::with_capacity(raw.len());
    for item in raw {
        let (kind, text) = match &item.token {
            SqlToken::Whitespace(_) | SqlToken::EOF => continue,
            SqlToken::Word(word) => {
                let kind = if word.quote_style.is_some() {
                    TokenKind::QuotedIdentifier
                } else if is_structural(&word.value) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                (kind, word.value.clone())
            }
            SqlToken::Period => (TokenKind::Dot, ".".to_string()),
            SqlToken::Comma => (TokenKind::Comma, ",".to_string()),
            SqlToken::LParen => (TokenKind::LParen, "(".to_string()),
            SqlToken::RParen => (TokenKind::RParen, ")".to_string()),
            SqlToken::Mul => (TokenKind::Star, "*".to_string()),
            SqlToken::SemiColon => (TokenKind::Semicolon, ";".to_string()),
            SqlToken::Number(..)
            | SqlToken::SingleQuotedString(_)
            | SqlToken::DoubleQuotedString(_)
            | SqlToken::NationalStringLiteral(_)
            | SqlToken::HexStringLiteral(_) => (TokenKind::Literal, item.token.to_string()),
            other => (TokenKind::Operator, other.to_string()),
        };

        tokens.push(Token {
            kind,
            text,
            span: Span::new(
                Position::from_location(item.span.start),
                Position::from_location(item.span.end),
            ),
        });
    }

    tracing::trace!(count = tokens.len(), %dialect, "tokenized document");
    Ok(tokens)
}
