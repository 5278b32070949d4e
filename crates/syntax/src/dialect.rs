// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! SQL dialects understood by the tokenizer.
//!
//! The dialect only changes lexical rules: which characters quote an
//! identifier (backticks for the MySQL family, double quotes for the
//! PostgreSQL family) and which string literal forms exist. The outline
//! parser is dialect-agnostic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SqlDialect {
    /// MySQL, MariaDB and TiDB
    #[default]
    #[serde(alias = "mysql")]
    MySQL,
    /// PostgreSQL and CockroachDB
    #[serde(alias = "postgresql", alias = "postgres")]
    PostgreSQL,
    /// ANSI-flavoured fallback accepting both quoting styles
    #[serde(alias = "generic")]
    Generic,
}

impl SqlDialect {
    /// Lexer rules backing this dialect
    pub(crate) fn lexer(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
            SqlDialect::PostgreSQL => Box::new(PostgreSqlDialect {}),
            SqlDialect::Generic => Box::new(GenericDialect {}),
        }
    }

    /// Guess the dialect from an LSP `languageId`
    ///
    /// Editors commonly send `mysql`, `postgres`, `pgsql` or plain `sql`.
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Some(SqlDialect::MySQL),
            "postgres" | "postgresql" | "pgsql" | "cockroachdb" => Some(SqlDialect::PostgreSQL),
            _ => None,
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlDialect::MySQL => "mysql",
            SqlDialect::PostgreSQL => "postgresql",
            SqlDialect::Generic => "generic",
        };
        f.write_str(name)
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" | "tidb" => Ok(SqlDialect::MySQL),
            "postgresql" | "postgres" | "cockroachdb" => Ok(SqlDialect::PostgreSQL),
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}
