// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for the syntax layer

use thiserror::Error;

use crate::token::Position;

/// Result type alias for syntax operations
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Errors that make a document impossible to analyze
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// The tokenizer rejected the input (unterminated string, stray quote, ...)
    #[error("Tokenizer error at {position}: {message}")]
    Tokenize { message: String, position: Position },
}

impl SyntaxError {
    /// Position the error was reported at
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::Tokenize { position, .. } => *position,
        }
    }
}
