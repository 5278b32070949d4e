// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Outline parser
//!
//! A recovering recursive-descent pass over the token stream. It recognises
//! the statement skeleton (`WITH`, `SELECT ... FROM ...`, joins, set
//! operations, DML targets) and treats everything else as opaque token runs
//! that are only inspected for nested subqueries.
//!
//! ## Recovery
//!
//! The parser never returns an error. When it meets something it does not
//! understand it skips forward to the next `;` or the next statement keyword,
//! keeping every outline node it already built. Parenthesis depth is tracked
//! so that clause keywords inside function calls (`EXTRACT(YEAR FROM d)`) do
//! not end a clause early.

use crate::ast::{Cte, Ident, ParsedSql, ProjectionItem, Query, Statement, StatementKind, TableFactor};
use crate::dialect::SqlDialect;
use crate::error::SyntaxResult;
use crate::token::{Span, Token, TokenKind, tokenize};

const SET_OPERATORS: &[&str] = &["UNION", "INTERSECT", "EXCEPT", "MINUS"];

/// Keywords that end a projection list
const PROJECTION_END: &[&str] = &[
    "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "WINDOW", "INTO", "FOR", "UNION",
    "INTERSECT", "EXCEPT", "MINUS", "SELECT",
];

/// Keywords that end a join condition
const JOIN_CONDITION_END: &[&str] = &[
    "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "NATURAL", "STRAIGHT_JOIN", "WHERE",
    "GROUP", "HAVING", "ORDER", "LIMIT", "WINDOW", "FOR", "SET", "RETURNING", "UNION",
    "INTERSECT", "EXCEPT", "MINUS", "SELECT",
];

/// Keywords that end the trailing clauses of a statement
const STATEMENT_END: &[&str] = &["UNION", "INTERSECT", "EXCEPT", "MINUS", "SELECT"];

/// Keywords that end the `SET` list of an `UPDATE`
const ASSIGNMENT_END: &[&str] = &[
    "FROM", "WHERE", "ORDER", "LIMIT", "RETURNING", "UNION", "INTERSECT", "EXCEPT", "MINUS",
    "SELECT",
];

const JOIN_WORDS: &[&str] = &[
    "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "STRAIGHT_JOIN",
];

/// Words that may precede the target of a DML statement
const DML_MODIFIERS: &[&str] = &["LOW_PRIORITY", "HIGH_PRIORITY", "DELAYED", "QUICK", "IGNORE", "ONLY"];

/// Unquoted words that may follow a table name without being its alias
const TABLE_HINTS: &[&str] = &[
    "USE", "FORCE", "IGNORE", "PARTITION", "FETCH", "TABLESAMPLE", "QUALIFY", "PIVOT", "UNPIVOT",
];

/// MySQL index hint verbs, `USE INDEX (...)`
const INDEX_HINTS: &[&str] = &["USE", "FORCE", "IGNORE"];

/// What a depth-zero comma means while scanning an opaque token run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commas {
    /// Separates list items (projection)
    Split,
    /// Ends the run (join condition followed by another table)
    Stop,
    /// Plain punctuation (`GROUP BY a, b`)
    Ignore,
}

/// Tokenize and outline `sql`
///
/// Fails only when the tokenizer does; structural problems yield a partial
/// outline instead.
pub fn parse(sql: &str, dialect: SqlDialect) -> SyntaxResult<ParsedSql> {
    let tokens = tokenize(sql, dialect)?;
    let queries = OutlineParser::new(&tokens).parse_document();
    tracing::debug!(
        tokens = tokens.len(),
        statements = queries.len(),
        "parsed document outline"
    );
    Ok(ParsedSql { tokens, queries })
}

struct OutlineParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> OutlineParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_document(&mut self) -> Vec<Query> {
        let mut queries = Vec::new();
        while self.pos < self.tokens.len() {
            let start = self.pos;
            if let Some(query) = self.parse_top_level() {
                queries.push(query);
            }
            self.skip_statement_rest();
            if self.pos == start {
                self.pos += 1;
            }
        }
        queries
    }

    fn parse_top_level(&mut self) -> Option<Query> {
        let token = self.peek()?;
        if self.starts_query(self.pos) {
            return self.parse_query();
        }

        let statement = if token.is_any_keyword(&["INSERT", "REPLACE"]) {
            self.parse_insert()
        } else if token.is_keyword("UPDATE") {
            self.parse_update()
        } else if token.is_keyword("DELETE") {
            self.parse_delete()
        } else {
            return None;
        };

        Some(Query {
            span: statement.span,
            ctes: Vec::new(),
            body: vec![statement],
        })
    }

    /// Skip to the end of the current statement
    ///
    /// Stops after a `;`, or before a depth-zero `SELECT`/`WITH` that starts
    /// a new statement (`CREATE VIEW v AS SELECT ...` keeps its query).
    fn skip_statement_rest(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return;
                }
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Keyword if depth == 0 && token.is_any_keyword(&["SELECT", "WITH"]) => {
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    // ---- queries -------------------------------------------------------

    fn parse_query(&mut self) -> Option<Query> {
        let start = self.pos;
        let ctes = if self.peek_keyword("WITH") {
            self.parse_with()
        } else {
            Vec::new()
        };

        let mut body = Vec::new();
        loop {
            self.parse_arm(&mut body);
            if !self.peek().is_some_and(|t| t.is_any_keyword(SET_OPERATORS)) {
                break;
            }
            self.pos += 1;
            while self.peek().is_some_and(|t| t.is_any_keyword(&["ALL", "DISTINCT"])) {
                self.pos += 1;
            }
        }

        // ORDER BY / LIMIT applying to a parenthesized set operation
        self.scan(&mut Vec::new(), STATEMENT_END, Commas::Ignore);

        if body.is_empty() && ctes.is_empty() {
            return None;
        }
        Some(Query {
            span: self.span_from(start),
            ctes,
            body,
        })
    }

    fn parse_arm(&mut self, body: &mut Vec<Statement>) {
        let Some(token) = self.peek() else {
            return;
        };

        if token.is_keyword("SELECT") {
            body.push(self.parse_select());
        } else if token.kind == TokenKind::LParen && self.starts_query(self.pos + 1) {
            self.pos += 1;
            if let Some(inner) = self.parse_query() {
                body.extend(inner.body);
            }
            self.eat_kind(TokenKind::RParen);
        } else if token.is_any_keyword(&["INSERT", "REPLACE"]) {
            body.push(self.parse_insert());
        } else if token.is_keyword("UPDATE") {
            body.push(self.parse_update());
        } else if token.is_keyword("DELETE") {
            body.push(self.parse_delete());
        }
    }

    fn parse_with(&mut self) -> Vec<Cte> {
        self.pos += 1;
        self.eat_keyword("RECURSIVE");

        let mut ctes = Vec::new();
        while let Some(name) = self.parse_ident() {
            let columns = if self.peek_kind(TokenKind::LParen) {
                self.parse_ident_list()
            } else {
                Vec::new()
            };
            if !self.eat_keyword("AS") {
                break;
            }
            // PostgreSQL: AS [NOT] MATERIALIZED (...)
            self.eat_keyword("NOT");
            if self
                .peek()
                .is_some_and(|t| t.kind == TokenKind::Identifier && t.text.eq_ignore_ascii_case("MATERIALIZED"))
            {
                self.pos += 1;
            }
            if !self.eat_kind(TokenKind::LParen) {
                break;
            }
            let query = self.parse_query();
            self.eat_kind(TokenKind::RParen);
            if let Some(query) = query {
                ctes.push(Cte { name, columns, query });
            }
            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }
        ctes
    }

    // ---- statements ----------------------------------------------------

    fn parse_select(&mut self) -> Statement {
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(|t| t.is_any_keyword(&["DISTINCT", "ALL"])) {
            self.pos += 1;
        }

        let mut statement = Statement::new(StatementKind::Select, Span::default());
        let items = self.scan(&mut statement.subqueries, PROJECTION_END, Commas::Split);
        statement.projection = items
            .into_iter()
            .map(|(from, to)| self.projection_item(from, to))
            .collect();

        if self.eat_keyword("INTO") {
            // SELECT ... INTO @var FROM ...
            self.scan(&mut statement.subqueries, PROJECTION_END, Commas::Ignore);
        }
        if self.eat_keyword("FROM") {
            self.parse_from_list(&mut statement);
        }
        self.scan(&mut statement.subqueries, STATEMENT_END, Commas::Ignore);

        statement.span = self.span_from(start);
        statement
    }

    fn parse_insert(&mut self) -> Statement {
        let start = self.pos;
        self.pos += 1;
        self.skip_modifiers();
        self.eat_keyword("INTO");

        let mut statement = Statement::new(StatementKind::Insert, Span::default());
        if let Some(name) = self.parse_table_name() {
            // The column list follows the name directly, so only `AS alias` is accepted
            let alias = if self.peek_keyword("AS") { self.parse_alias() } else { None };
            statement.from.push(TableFactor::Table { name, alias });
        }
        if self.peek_kind(TokenKind::LParen) && !self.starts_query(self.pos + 1) {
            statement.target_columns = self.parse_ident_list();
        }
        if self.starts_query(self.pos) {
            if let Some(query) = self.parse_query() {
                statement.subqueries.push(query);
            }
        }
        // VALUES (...), SET a = 1, ON DUPLICATE KEY UPDATE ...
        self.scan(&mut statement.subqueries, STATEMENT_END, Commas::Ignore);

        statement.span = self.span_from(start);
        statement
    }

    fn parse_update(&mut self) -> Statement {
        let start = self.pos;
        self.pos += 1;
        self.skip_modifiers();

        let mut statement = Statement::new(StatementKind::Update, Span::default());
        self.parse_from_list(&mut statement);
        if self.eat_keyword("SET") {
            self.scan(&mut statement.subqueries, ASSIGNMENT_END, Commas::Ignore);
        }
        if self.eat_keyword("FROM") {
            self.parse_from_list(&mut statement);
        }
        self.scan(&mut statement.subqueries, STATEMENT_END, Commas::Ignore);

        statement.span = self.span_from(start);
        statement
    }

    fn parse_delete(&mut self) -> Statement {
        let start = self.pos;
        self.pos += 1;
        self.skip_modifiers();

        let mut statement = Statement::new(StatementKind::Delete, Span::default());
        if !self.peek_keyword("FROM") {
            // MySQL multi-table form: DELETE t1, t2 FROM ...
            self.scan(&mut statement.subqueries, &["FROM", "SELECT"], Commas::Ignore);
        }
        if self.eat_keyword("FROM") {
            self.parse_from_list(&mut statement);
        }
        if self.eat_keyword("USING") {
            self.parse_from_list(&mut statement);
        }
        self.scan(&mut statement.subqueries, STATEMENT_END, Commas::Ignore);

        statement.span = self.span_from(start);
        statement
    }

    fn skip_modifiers(&mut self) {
        while self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Identifier && DML_MODIFIERS.iter().any(|m| t.text.eq_ignore_ascii_case(m)))
        {
            self.pos += 1;
        }
    }

    // ---- FROM ----------------------------------------------------------

    fn parse_from_list(&mut self, statement: &mut Statement) {
        self.parse_table_factor(statement);
        let mut after_join = false;
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Comma {
                self.pos += 1;
                self.parse_table_factor(statement);
                after_join = false;
            } else if token.is_any_keyword(JOIN_WORDS) {
                while self.peek().is_some_and(|t| t.is_any_keyword(JOIN_WORDS)) {
                    self.pos += 1;
                }
                self.parse_table_factor(statement);
                after_join = true;
            } else if after_join && token.is_any_keyword(&["ON", "USING"]) {
                self.pos += 1;
                self.scan(&mut statement.subqueries, JOIN_CONDITION_END, Commas::Stop);
                after_join = false;
            } else {
                break;
            }
        }
    }

    fn parse_table_factor(&mut self, statement: &mut Statement) {
        self.eat_keyword("LATERAL");
        let Some(token) = self.peek() else {
            return;
        };

        match token.kind {
            TokenKind::LParen if self.starts_query(self.pos + 1) => {
                self.pos += 1;
                let subquery = self.parse_query();
                self.eat_kind(TokenKind::RParen);
                let alias = self.parse_alias();
                if let Some(subquery) = subquery {
                    statement.from.push(TableFactor::Derived {
                        subquery: Box::new(subquery),
                        alias,
                    });
                }
            }
            TokenKind::LParen => {
                // Parenthesized join: (a JOIN b ON ...)
                self.pos += 1;
                self.parse_from_list(statement);
                self.eat_kind(TokenKind::RParen);
                self.parse_alias();
            }
            kind if kind.is_identifier() => {
                let Some(name) = self.parse_table_name() else {
                    return;
                };
                if self.peek_kind(TokenKind::LParen) {
                    // Table function arguments
                    self.skip_balanced();
                }
                if self.peek_word(&["PARTITION"]) && self.word_at(self.pos + 1).is_some_and(|t| t.kind == TokenKind::LParen) {
                    self.pos += 1;
                    self.skip_balanced();
                }
                let alias = self.parse_alias();
                self.skip_index_hints();
                statement.from.push(TableFactor::Table { name, alias });
            }
            _ => {}
        }
    }

    /// `name` or `schema.name`, each part an identifier
    fn parse_table_name(&mut self) -> Option<Vec<Ident>> {
        let mut name = vec![self.parse_ident()?];
        while self.peek_kind(TokenKind::Dot)
            && self.tokens.get(self.pos + 1).is_some_and(|t| t.kind.is_identifier())
        {
            self.pos += 1;
            if let Some(part) = self.parse_ident() {
                name.push(part);
            }
        }
        Some(name)
    }

    fn parse_alias(&mut self) -> Option<Ident> {
        if self.eat_keyword("AS") {
            return self.parse_ident();
        }
        let implicit = self.peek().is_some_and(|t| {
            t.kind == TokenKind::QuotedIdentifier || (t.kind == TokenKind::Identifier && !self.peek_word(TABLE_HINTS))
        });
        if implicit {
            return self.parse_ident();
        }
        None
    }

    /// `{USE | FORCE | IGNORE} {INDEX | KEY} [FOR JOIN | FOR ORDER BY | FOR GROUP BY] (...)`, repeated
    fn skip_index_hints(&mut self) {
        while self.peek_word(INDEX_HINTS)
            && self
                .word_at(self.pos + 1)
                .is_some_and(|t| t.text.eq_ignore_ascii_case("INDEX") || t.text.eq_ignore_ascii_case("KEY"))
        {
            self.pos += 2;
            if self.eat_keyword("FOR") {
                if self.peek_keyword("JOIN") {
                    self.pos += 1;
                } else if self.peek_keyword("ORDER") || self.peek_keyword("GROUP") {
                    self.pos += 1;
                    self.eat_keyword("BY");
                }
            }
            if self.peek_kind(TokenKind::LParen) {
                self.skip_balanced();
            }
        }
    }

    // ---- projection ----------------------------------------------------

    fn projection_item(&self, from: usize, to: usize) -> ProjectionItem {
        let tokens = &self.tokens[from..to];
        let (body_len, alias) = self.split_alias(from, to);
        let body = &tokens[..body_len];

        let is_chain = !body.is_empty()
            && body.len() % 2 == 1
            && body.iter().enumerate().all(|(i, t)| {
                if i % 2 == 1 {
                    t.kind == TokenKind::Dot
                } else if i + 1 == body.len() {
                    t.kind.is_identifier() || t.kind == TokenKind::Star
                } else {
                    t.kind.is_identifier()
                }
            });
        if !is_chain {
            return ProjectionItem::Expression { alias };
        }

        let last = body.len() - 1;
        let qualifier = (body.len() >= 3).then(|| self.ident_at(from + last - 2));
        if body[last].kind == TokenKind::Star {
            ProjectionItem::Wildcard { qualifier }
        } else {
            ProjectionItem::Column {
                qualifier,
                name: self.ident_at(from + last),
                alias,
            }
        }
    }

    /// Split a trailing `AS alias` or implicit alias off a projection item
    fn split_alias(&self, from: usize, to: usize) -> (usize, Option<Ident>) {
        let len = to - from;
        if len < 2 {
            return (len, None);
        }
        let last = &self.tokens[to - 1];
        let before = &self.tokens[to - 2];
        if !last.kind.is_identifier() {
            return (len, None);
        }
        if before.is_keyword("AS") {
            return (len - 2, Some(self.ident_at(to - 1)));
        }
        let implicit = matches!(
            before.kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier | TokenKind::RParen | TokenKind::Literal
        ) || before.is_keyword("END");
        if implicit {
            (len - 1, Some(self.ident_at(to - 1)))
        } else {
            (len, None)
        }
    }

    // ---- opaque runs ---------------------------------------------------

    /// Walk an opaque token run, collecting nested subqueries
    ///
    /// Returns the `[from, to)` token ranges of the run's comma-separated
    /// items. The run ends before a depth-zero keyword in `stop`, a `;`, an
    /// unmatched `)`, or (in [`Commas::Stop`] mode) a depth-zero comma.
    fn scan(&mut self, subqueries: &mut Vec<Query>, stop: &[&str], commas: Commas) -> Vec<(usize, usize)> {
        let mut items = Vec::new();
        let mut item_start = self.pos;
        let mut depth = 0usize;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::RParen if depth == 0 => break,
                TokenKind::RParen => {
                    depth -= 1;
                    self.pos += 1;
                }
                TokenKind::LParen if self.starts_query(self.pos + 1) => {
                    self.pos += 1;
                    if let Some(query) = self.parse_query() {
                        subqueries.push(query);
                    }
                    self.eat_kind(TokenKind::RParen);
                }
                TokenKind::LParen => {
                    depth += 1;
                    self.pos += 1;
                }
                TokenKind::Comma if depth == 0 && commas == Commas::Stop => break,
                TokenKind::Comma if depth == 0 && commas == Commas::Split => {
                    items.push((item_start, self.pos));
                    self.pos += 1;
                    item_start = self.pos;
                }
                TokenKind::Keyword if depth == 0 && token.is_any_keyword(stop) => break,
                _ => self.pos += 1,
            }
        }

        if self.pos > item_start {
            items.push((item_start, self.pos));
        }
        items
    }

    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                TokenKind::Semicolon => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn parse_ident_list(&mut self) -> Vec<Ident> {
        let mut idents = Vec::new();
        if !self.eat_kind(TokenKind::LParen) {
            return idents;
        }
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::RParen => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Semicolon => break,
                kind if kind.is_identifier() => {
                    idents.push(self.ident_at(self.pos));
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        idents
    }

    // ---- token helpers -------------------------------------------------

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Unquoted word among `words`, whatever its token kind
    fn peek_word(&self, words: &[&str]) -> bool {
        self.peek().is_some_and(|t| {
            matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword) && words.iter().any(|w| t.text.eq_ignore_ascii_case(w))
        })
    }

    fn word_at(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        let matched = self.peek_kind(kind);
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let matched = self.peek_keyword(keyword);
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn starts_query(&self, at: usize) -> bool {
        match self.tokens.get(at) {
            Some(t) if t.is_any_keyword(&["SELECT", "WITH"]) => true,
            Some(t) if t.kind == TokenKind::LParen => self.starts_query(at + 1),
            _ => false,
        }
    }

    fn parse_ident(&mut self) -> Option<Ident> {
        let token = self.peek()?;
        if !token.kind.is_identifier() {
            return None;
        }
        let ident = self.ident_at(self.pos);
        self.pos += 1;
        Some(ident)
    }

    fn ident_at(&self, index: usize) -> Ident {
        let token = &self.tokens[index];
        Ident {
            value: token.text.clone(),
            token: index,
            span: token.span,
        }
    }

    /// Span from the token at `start` through the last consumed token
    fn span_from(&self, start: usize) -> Span {
        let Some(first) = self.tokens.get(start) else {
            return Span::default();
        };
        match self.pos.checked_sub(1).and_then(|last| self.tokens.get(last)) {
            Some(last) if self.pos > start => Span::new(first.span.start, last.span.end),
            _ => first.span,
        }
    }
}
