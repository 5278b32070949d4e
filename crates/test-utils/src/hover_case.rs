// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Text-based hover case format
//!
//! Cases are separated by `---` and use a YAML-like field syntax. The input
//! carries a `|` marking the cursor; `expected` is the hover text, left blank
//! when no hover is expected.
//!
//! ```text
//! ---
//! description: Bare column
//! dialect: mysql
//! input: SELECT I|D FROM city
//! expected: city.ID column
//! ```

use std::path::Path;

use sqlsight_syntax::SqlDialect;
use thiserror::Error;

/// Character marking the cursor inside a case input
pub const CURSOR_MARKER: char = '|';

/// A single hover expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverCase {
    pub description: String,
    /// `None` runs the case under every dialect
    pub dialect: Option<SqlDialect>,
    /// SQL text with the cursor marker removed
    pub sql: String,
    /// Zero-based cursor line
    pub line: u32,
    /// Zero-based cursor column, in characters
    pub column: u32,
    /// Expected hover text; empty means no hover
    pub expected: String,
}

/// Parse errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dialect value: {0}")]
    InvalidDialect(String),

    #[error("Invalid syntax at line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Empty test case file")]
    EmptyFile,
}

const FIELDS: &[&str] = &["description", "dialect", "input", "expected"];

/// Parse a hover case file
pub fn parse_case_file(path: &Path) -> Result<Vec<HoverCase>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_cases(&content)
}

/// Parse hover cases from a string
pub fn parse_cases(content: &str) -> Result<Vec<HoverCase>, ParseError> {
    let mut cases = Vec::new();
    let mut current_case = HoverCaseBuilder::default();
    let mut current_field: Option<&'static str> = None;
    let mut current_value: Vec<String> = Vec::new();
    let mut line_num = 0;

    for line in content.lines() {
        line_num += 1;
        let trimmed = line.trim();

        if trimmed.is_empty() && current_field.is_none() {
            continue;
        }

        if trimmed == "---" {
            if let Some(field) = current_field.take() {
                current_case.set_field(field, &current_value, line_num)?;
            }
            if current_case.has_fields() {
                cases.push(std::mem::take(&mut current_case).build(line_num)?);
            }
            current_value.clear();
            continue;
        }

        // Only known field names start a field, so SQL lines may contain ':'
        if let Some((key, value)) = split_field(trimmed) {
            if let Some(field) = current_field {
                current_case.set_field(field, &current_value, line_num)?;
            }
            current_field = Some(key);
            current_value.clear();
            if !value.is_empty() && value != "|" {
                current_value.push(value.to_string());
            }
            continue;
        }

        if current_field.is_some() {
            current_value.push(line.to_string());
        }
    }

    if let Some(field) = current_field {
        current_case.set_field(field, &current_value, line_num)?;
    }
    if current_case.has_fields() {
        cases.push(current_case.build(line_num)?);
    }

    if cases.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    Ok(cases)
}

fn split_field(line: &str) -> Option<(&'static str, &str)> {
    let (key, value) = line.split_once(':')?;
    let field = FIELDS.iter().find(|f| **f == key.trim())?;
    Some((*field, value.trim()))
}

/// Remove the cursor marker and report where it was
///
/// Returns `(text, line, column)` with zero-based coordinates, or `None` when
/// the input carries no marker.
///
/// # Examples
///
/// ```
/// use sqlsight_test_utils::split_cursor;
///
/// let (sql, line, column) = split_cursor("SELECT ci.I|D\nFROM city ci").unwrap();
/// assert_eq!(sql, "SELECT ci.ID\nFROM city ci");
/// assert_eq!((line, column), (0, 11));
/// ```
pub fn split_cursor(input: &str) -> Option<(String, u32, u32)> {
    let offset = input.find(CURSOR_MARKER)?;
    let before = &input[..offset];
    let line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() as u32;

    let mut sql = String::with_capacity(input.len());
    sql.push_str(before);
    sql.push_str(&input[offset + CURSOR_MARKER.len_utf8()..]);
    Some((sql, line, column))
}

#[derive(Default)]
struct HoverCaseBuilder {
    description: Option<String>,
    dialect: Option<SqlDialect>,
    input: Option<String>,
    expected: Option<String>,
}

impl HoverCaseBuilder {
    fn has_fields(&self) -> bool {
        self.description.is_some() || self.input.is_some()
    }

    fn set_field(&mut self, field: &str, value: &[String], line: usize) -> Result<(), ParseError> {
        match field {
            "description" => self.description = Some(value.join("\n").trim().to_string()),
            "dialect" => {
                let raw = value.join("").trim().to_lowercase();
                self.dialect = match raw.as_str() {
                    "" | "all" => None,
                    other => Some(
                        other
                            .parse()
                            .map_err(|_| ParseError::InvalidDialect(raw.clone()))?,
                    ),
                };
            }
            "input" => self.input = Some(dedent(value)),
            "expected" => self.expected = Some(value.join("\n").trim().to_string()),
            _ => {
                return Err(ParseError::InvalidSyntax {
                    line,
                    message: format!("unknown field '{}'", field),
                });
            }
        }
        Ok(())
    }

    fn build(self, line_num: usize) -> Result<HoverCase, ParseError> {
        let description = self.description.ok_or(ParseError::InvalidSyntax {
            line: line_num,
            message: "missing description field".to_string(),
        })?;

        let input = self.input.ok_or(ParseError::InvalidSyntax {
            line: line_num,
            message: "missing input field".to_string(),
        })?;

        let (sql, line, column) = split_cursor(&input).ok_or(ParseError::InvalidSyntax {
            line: line_num,
            message: format!("no cursor marker in input of '{}'", description),
        })?;

        Ok(HoverCase {
            description,
            dialect: self.dialect,
            sql,
            line,
            column,
            expected: self.expected.unwrap_or_default(),
        })
    }
}

/// Remove common leading whitespace from multi-line text
fn dedent(lines: &[String]) -> String {
    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let result: Vec<&str> = lines
        .iter()
        .map(|line| line.get(min_indent..).unwrap_or(line.as_str()))
        .collect();

    result.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_case() {
        let content = r#"
---
description: Test case
dialect: mysql
input: SELECT I|D FROM city
expected: city.ID column
"#;

        let cases = parse_cases(content).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].description, "Test case");
        assert_eq!(cases[0].dialect, Some(SqlDialect::MySQL));
        assert_eq!(cases[0].sql, "SELECT ID FROM city");
        assert_eq!((cases[0].line, cases[0].column), (0, 8));
        assert_eq!(cases[0].expected, "city.ID column");
    }

    #[test]
    fn test_parse_multiple_cases_and_blank_expectation() {
        let content = r#"
---
description: First
input: SELECT| ID FROM city
expected:

---
description: Second
dialect: all
input: |
  SELECT ID
  FROM ci|ty
expected: city table
"#;

        let cases = parse_cases(content).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].expected, "");
        assert_eq!(cases[0].column, 6);
        assert_eq!(cases[1].dialect, None);
        assert_eq!(cases[1].sql, "SELECT ID\nFROM city");
        assert_eq!((cases[1].line, cases[1].column), (1, 7));
    }

    #[test]
    fn test_sql_lines_with_colons_are_not_fields() {
        let content = "---\ndescription: Cast\ninput: |\n  SELECT ID::text\n  FROM ci|ty\nexpected: city table\n";
        let cases = parse_cases(content).unwrap();
        assert_eq!(cases[0].sql, "SELECT ID::text\nFROM city");
    }

    #[test]
    fn test_missing_cursor_is_an_error() {
        let content = "---\ndescription: No cursor\ninput: SELECT 1\n";
        assert!(matches!(
            parse_cases(content),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_invalid_dialect() {
        let content = "---\ndescription: Bad\ndialect: oracle\ninput: SELECT |1\n";
        assert!(matches!(parse_cases(content), Err(ParseError::InvalidDialect(_))));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse_cases(""), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_dedent() {
        let lines = vec![
            "    SELECT".to_string(),
            "      id,".to_string(),
            "      name".to_string(),
        ];
        assert_eq!(dedent(&lines), "SELECT\n  id,\n  name");
    }
}
