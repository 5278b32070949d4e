// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample SQL queries

use crate::hover_case::{HoverCase, ParseError, parse_cases};

/// Hover expectations against the `world` schema, in the text case format
pub const WORLD_HOVER_CASES: &str = include_str!("../fixtures/world_hover.txt");

/// Parsed [`WORLD_HOVER_CASES`]
pub fn world_hover_cases() -> Result<Vec<HoverCase>, ParseError> {
    parse_cases(WORLD_HOVER_CASES)
}

/// Sample SQL queries over the `world` schema
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Basic SELECT queries =====

    /// Simple SELECT with column list
    pub const fn simple_select() -> &'static str {
        "SELECT ID, Name FROM city"
    }

    /// Columns qualified by the table name
    pub const fn qualified_select() -> &'static str {
        "SELECT city.ID, city.Name FROM city"
    }

    /// Columns qualified by an alias
    pub const fn aliased_select() -> &'static str {
        "SELECT ci.ID, ci.Name FROM city AS ci"
    }

    // ===== JOIN queries =====

    /// Comma join; `Name` exists in both tables
    pub const fn comma_join() -> &'static str {
        "SELECT Name FROM city, country"
    }

    /// Explicit join with aliases
    pub const fn inner_join() -> &'static str {
        "SELECT ci.Name, co.Continent
         FROM city ci
         INNER JOIN country co ON ci.CountryCode = co.Code"
    }

    // ===== Nested queries =====

    /// Derived table reading a single base table
    pub const fn derived_table() -> &'static str {
        "SELECT it.ID, it.Name FROM (SELECT ci.ID, ci.Name, ci.CountryCode, ci.District, ci.Population FROM city AS ci) as it"
    }

    /// Subquery in WHERE
    pub const fn where_subquery() -> &'static str {
        "SELECT ID FROM city WHERE CountryCode IN (SELECT Code FROM country WHERE Continent = 'Asia')"
    }

    /// Common table expression
    pub const fn cte() -> &'static str {
        "WITH big AS (SELECT Name, Population FROM city WHERE Population > 1000000) SELECT b.Name FROM big b"
    }

    // ===== Error cases =====

    /// Unterminated string literal; the tokenizer rejects it
    pub const fn unterminated_literal() -> &'static str {
        "SELECT ID FROM city WHERE Name = 'Kabul"
    }

    /// Query with undefined table
    pub const fn undefined_table() -> &'static str {
        "SELECT ID FROM cities"
    }
}
