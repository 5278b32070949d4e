// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Scope building from the statement outline
//!
//! In SQL, a "scope" tracks which tables are visible at a given position in
//! the query. The builder walks every statement of a [`ParsedSql`] outline
//! and produces one [`Scope`](sqlsight_semantic::Scope) per statement level.
//!
//! ## Example
//!
//! ```sql
//! SELECT it.ID                          -- scope 1: table `it` (derived)
//! FROM (SELECT ci.ID FROM city AS ci)   -- scope 2: table `city` aliased `ci`
//!      AS it
//! ```
//!
//! Scope 2 is a child of scope 1 but the two never share tables: `ci` is
//! invisible from the outer projection and `it` from the inner one.
//!
//! ## Creation order
//!
//! A scope is always created before the scopes nested inside it, which is
//! what lets [`ScopeTree::innermost_scope_at`] pick the innermost match by
//! searching from the end. CTE bodies come first, then each set-operation
//! arm, then for every arm its derived tables and other subqueries.

use sqlsight_semantic::{ProjectionColumn, ScopeId, ScopeKind, ScopeTree, TableRef};
use sqlsight_syntax::{Ident, ParsedSql, ProjectionItem, Query, Statement, TableFactor};

/// A `WITH` binding visible while building
#[derive(Debug, Clone)]
struct CteBinding {
    name: String,
    scope_id: ScopeId,
    columns: Vec<String>,
}

/// Builds a [`ScopeTree`] from a parsed document
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    tree: ScopeTree,
    /// Innermost binding last; shadowing is resolved by searching from the end
    ctes: Vec<CteBinding>,
}

impl ScopeBuilder {
    /// Build the scopes of every statement in `parsed`
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlsight_context::ScopeBuilder;
    /// use sqlsight_syntax::{Position, SqlDialect, parse};
    ///
    /// let parsed = parse("SELECT ci.ID FROM city AS ci", SqlDialect::MySQL).unwrap();
    /// let tree = ScopeBuilder::build(&parsed);
    ///
    /// let scope = tree.innermost_scope_at(Position::new(0, 7)).unwrap();
    /// assert_eq!(scope.tables[0].canonical_name, "city");
    /// assert_eq!(scope.tables[0].alias.as_deref(), Some("ci"));
    /// ```
    pub fn build(parsed: &ParsedSql) -> ScopeTree {
        let mut builder = Self::default();
        for query in &parsed.queries {
            builder.build_query(query, None, ScopeKind::Query);
        }
        tracing::debug!(
            statements = parsed.queries.len(),
            scopes = builder.tree.scope_count(),
            "built scope tree"
        );
        builder.tree
    }

    /// Build a query and return the scope of its first arm
    fn build_query(&mut self, query: &Query, parent: Option<ScopeId>, kind: ScopeKind) -> Option<ScopeId> {
        let visible = self.ctes.len();

        // Each CTE body sees the bindings declared before it
        for cte in &query.ctes {
            if let Some(scope_id) = self.build_query(&cte.query, parent, ScopeKind::Cte) {
                self.ctes.push(CteBinding {
                    name: cte.name.value.clone(),
                    scope_id,
                    columns: cte.columns.iter().map(|c| c.value.clone()).collect(),
                });
            }
        }

        let mut first = None;
        for statement in &query.body {
            let scope_id = self.build_statement(statement, parent, kind);
            first.get_or_insert(scope_id);
        }

        self.ctes.truncate(visible);
        first
    }

    fn build_statement(&mut self, statement: &Statement, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let scope_id = self.tree.create_scope(kind, parent, statement.span);
        if let Some(scope) = self.tree.get_scope_mut(scope_id) {
            scope.projection = statement.projection.iter().map(projection_column).collect();
        }

        for factor in &statement.from {
            self.add_factor(scope_id, factor);
        }
        for subquery in &statement.subqueries {
            self.build_query(subquery, Some(scope_id), ScopeKind::Subquery);
        }
        scope_id
    }

    fn add_factor(&mut self, scope_id: ScopeId, factor: &TableFactor) {
        match factor {
            TableFactor::Table { name, alias } => {
                let Some(table_name) = name.last() else {
                    return;
                };
                let binding = if name.len() == 1 {
                    self.find_cte(&table_name.value).cloned()
                } else {
                    None
                };
                let table = match binding {
                    Some(cte) => TableRef::common_table(&cte.name, cte.scope_id, cte.columns),
                    None => TableRef::base(&table_name.value),
                };
                let table = with_alias(table, alias.as_ref());
                let tokens = table_tokens(Some(table_name), alias.as_ref());
                self.tree.add_table(scope_id, table, &tokens);
            }
            TableFactor::Derived { subquery, alias } => {
                let Some(inner) = self.build_query(subquery, Some(scope_id), ScopeKind::Derived) else {
                    return;
                };
                let source = self.tree.get_scope(inner).and_then(|s| s.single_source_table());
                let mut table = with_alias(TableRef::derived(inner), alias.as_ref());
                if let Some(source) = source {
                    table = table.with_source_table(source);
                }
                let tokens = table_tokens(None, alias.as_ref());
                self.tree.add_table(scope_id, table, &tokens);
            }
        }
    }

    fn find_cte(&self, name: &str) -> Option<&CteBinding> {
        self.ctes.iter().rev().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

fn with_alias(table: TableRef, alias: Option<&Ident>) -> TableRef {
    match alias {
        Some(alias) => table.with_alias(&alias.value),
        None => table,
    }
}

fn table_tokens(name: Option<&Ident>, alias: Option<&Ident>) -> Vec<usize> {
    name.into_iter().chain(alias).map(|ident| ident.token).collect()
}

fn projection_column(item: &ProjectionItem) -> ProjectionColumn {
    match item {
        ProjectionItem::Column {
            qualifier,
            name,
            alias,
        } => ProjectionColumn::Column {
            qualifier: qualifier.as_ref().map(|q| q.value.clone()),
            name: name.value.clone(),
            alias: alias.as_ref().map(|a| a.value.clone()),
        },
        ProjectionItem::Wildcard { qualifier } => ProjectionColumn::Wildcard {
            qualifier: qualifier.as_ref().map(|q| q.value.clone()),
        },
        // Unaliased expressions keep their position for CTE column lists
        ProjectionItem::Expression { alias } => ProjectionColumn::Expression {
            alias: alias.as_ref().map(|a| a.value.clone()).unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlsight_semantic::TableOrigin;
    use sqlsight_syntax::{Position, SqlDialect, parse};

    fn build(sql: &str) -> ScopeTree {
        let parsed = parse(sql, SqlDialect::MySQL).unwrap();
        ScopeBuilder::build(&parsed)
    }

    fn at(tree: &ScopeTree, column: u32) -> &sqlsight_semantic::Scope {
        tree.innermost_scope_at(Position::new(0, column)).unwrap()
    }

    #[test]
    fn test_simple_from() {
        let tree = build("SELECT ID, Name FROM city");
        assert_eq!(tree.scope_count(), 1);

        let scope = at(&tree, 7);
        assert_eq!(scope.kind, ScopeKind::Query);
        assert_eq!(scope.tables, vec![TableRef::base("city")]);
        assert_eq!(scope.projection.len(), 2);
        // `city` is token 5
        assert_eq!(tree.table_at_token(5), Some((scope.id, 0)));
    }

    #[test]
    fn test_joins_share_one_scope() {
        let tree = build(
            "SELECT * FROM city ci LEFT OUTER JOIN country co ON ci.CountryCode = co.Code, countrylanguage",
        );
        let names: Vec<_> = at(&tree, 0)
            .tables
            .iter()
            .map(|t| (t.canonical_name.as_str(), t.alias.as_deref()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("city", Some("ci")),
                ("country", Some("co")),
                ("countrylanguage", None)
            ]
        );
    }

    #[test]
    fn test_schema_qualified_table() {
        let tree = build("SELECT c.ID FROM world.city c");
        let scope = at(&tree, 0);
        assert_eq!(scope.tables, vec![TableRef::base("city").with_alias("c")]);
        // `world` is not a table token, `city` and `c` are
        assert_eq!(tree.table_at_token(5), None);
        assert!(tree.table_at_token(7).is_some());
        assert!(tree.table_at_token(8).is_some());
    }

    #[test]
    fn test_derived_table_gets_child_scope() {
        let sql = "SELECT it.ID FROM (SELECT ci.ID, ci.Name FROM city AS ci) as it";
        let tree = build(sql);
        assert_eq!(tree.scope_count(), 2);

        let outer = at(&tree, 7);
        let table = &outer.tables[0];
        assert!(table.is_derived());
        assert_eq!(table.alias.as_deref(), Some("it"));
        assert_eq!(table.source_table.as_deref(), Some("city"));

        let inner = at(&tree, 26);
        assert_eq!(inner.kind, ScopeKind::Derived);
        assert_eq!(inner.parent_id, Some(outer.id));
        assert_eq!(inner.tables, vec![TableRef::base("city").with_alias("ci")]);
        assert_eq!(table.origin, TableOrigin::DerivedSubquery { scope_id: inner.id });
    }

    #[test]
    fn test_derived_table_over_two_tables_has_no_source() {
        let tree = build("SELECT d.x FROM (SELECT ci.ID, co.Code FROM city ci, country co) d");
        let outer = at(&tree, 0);
        assert_eq!(outer.tables[0].source_table, None);
        assert_eq!(outer.tables[0].display_name(), "d");
    }

    #[test]
    fn test_where_subquery_scope() {
        let sql = "SELECT ID FROM city WHERE CountryCode IN (SELECT Code FROM country)";
        let tree = build(sql);
        assert_eq!(tree.scope_count(), 2);

        let inner = at(&tree, 50);
        assert_eq!(inner.kind, ScopeKind::Subquery);
        assert_eq!(inner.tables, vec![TableRef::base("country")]);
        assert_eq!(at(&tree, 7).tables, vec![TableRef::base("city")]);
    }

    #[test]
    fn test_cte_reference() {
        let sql = "WITH big (n, p) AS (SELECT Name, Population FROM city) SELECT n FROM big b";
        let tree = build(sql);
        assert_eq!(tree.scope_count(), 2);

        let cte = tree.get_scope(0).unwrap();
        assert_eq!(cte.kind, ScopeKind::Cte);

        let main = at(&tree, 60);
        let table = &main.tables[0];
        assert_eq!(table.canonical_name, "big");
        assert_eq!(table.alias.as_deref(), Some("b"));
        assert_eq!(
            table.origin,
            TableOrigin::CommonTable {
                scope_id: cte.id,
                column_names: vec!["n".to_string(), "p".to_string()],
            }
        );
    }

    #[test]
    fn test_cte_not_visible_in_next_statement() {
        let tree = build("WITH big AS (SELECT Name FROM city) SELECT Name FROM big; SELECT Name FROM big");
        let last = tree.scopes().last().unwrap();
        assert_eq!(last.tables, vec![TableRef::base("big")]);
    }

    #[test]
    fn test_union_arms_are_separate_scopes() {
        let tree = build("SELECT Name FROM city UNION SELECT Name FROM country");
        assert_eq!(tree.scope_count(), 2);
        assert_eq!(at(&tree, 7).tables, vec![TableRef::base("city")]);
        assert_eq!(at(&tree, 35).tables, vec![TableRef::base("country")]);
    }

    #[test]
    fn test_dml_targets() {
        let tree = build("UPDATE city AS c SET Population = 0 WHERE ID = 1");
        assert_eq!(at(&tree, 0).tables, vec![TableRef::base("city").with_alias("c")]);

        let tree = build("DELETE FROM city WHERE ID = 1");
        assert_eq!(at(&tree, 0).tables, vec![TableRef::base("city")]);

        let tree = build("INSERT INTO city (ID, Name) VALUES (1, 'x')");
        assert_eq!(at(&tree, 18).tables, vec![TableRef::base("city")]);
    }

    #[test]
    fn test_unaliased_expression_keeps_position() {
        let tree = build("SELECT COUNT(*), Name AS n FROM city");
        assert_eq!(
            at(&tree, 0).projection,
            vec![
                ProjectionColumn::Expression { alias: String::new() },
                ProjectionColumn::Column {
                    qualifier: None,
                    name: "Name".to_string(),
                    alias: Some("n".to_string()),
                },
            ]
        );
    }
}
