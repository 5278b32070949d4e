// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Hover text for resolved symbols.

use crate::symbol::Symbol;

/// Render a symbol as hover text
///
/// Tables render as `"<name> table"`, columns as `"<table>.<column> column"`
/// with the table that defines the column, never an alias. Anything that did
/// not resolve to exactly one object renders as the empty string.
///
/// # Examples
///
/// ```
/// use sqlsight_semantic::{format_hover, ColumnRef, Symbol, TableRef};
///
/// let city = TableRef::base("city").with_alias("ci");
/// assert_eq!(format_hover(&Symbol::Table(city.clone())), "city table");
///
/// let id = ColumnRef::new("ID", "city");
/// assert_eq!(format_hover(&Symbol::Column(city, id)), "city.ID column");
/// assert_eq!(format_hover(&Symbol::NotFound), "");
/// ```
pub fn format_hover(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Table(table) => format!("{} table", table.display_name()),
        Symbol::Column(_, column) => format!("{}.{} column", column.table_name, column.name),
        Symbol::NotFound | Symbol::Ambiguous(_) => String::new(),
    }
}
