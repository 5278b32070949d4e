// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Position locator
//!
//! Maps a cursor to the token under it and classifies the token's role.
//!
//! ## Boundaries
//!
//! A cursor on any character of a token, first and last included, selects
//! that token. Whitespace selects nothing, with two exceptions around the dot
//! of a qualified reference:
//!
//! ```text
//! ci .ID     cursor on the space before the dot   -> `ci`
//! ci. ID     cursor on the space after the dot    -> `ID`
//! ci.ID      cursor on the dot itself             -> `ID`
//! ```

use sqlsight_semantic::{Located, Member, Reference, ScopeTree};
use sqlsight_syntax::{ParsedSql, Position, Token, TokenKind};

/// Index of the token a cursor at `position` selects
pub fn locate(tokens: &[Token], position: Position) -> Option<usize> {
    // Tokens are ordered; the first one ending after the cursor is the candidate
    let next = tokens.partition_point(|t| t.span.end <= position);
    let token = tokens.get(next)?;

    if token.span.contains(position) {
        if is_member_dot(tokens, next) {
            return Some(next + 1);
        }
        return Some(next);
    }

    // Whitespace: only the gap right before or right after a dot counts
    let prev = next.checked_sub(1)?;
    let before = &tokens[prev];
    if before.span.end.line != position.line || token.span.start.line != position.line {
        return None;
    }
    if is_member_dot(tokens, next) {
        return Some(prev);
    }
    if is_member_dot(tokens, prev) {
        return Some(next);
    }
    None
}

/// A dot with an identifier before it and an identifier or `*` after it
fn is_member_dot(tokens: &[Token], dot: usize) -> bool {
    let before = dot.checked_sub(1).and_then(|i| tokens.get(i));
    let after = tokens.get(dot + 1);
    tokens.get(dot).is_some_and(|t| t.kind == TokenKind::Dot)
        && before.is_some_and(|t| t.kind.is_identifier())
        && after.is_some_and(|t| t.kind.is_identifier() || t.kind == TokenKind::Star)
}

/// Role of the token at `index`
///
/// FROM-clause table names and aliases win over every other reading, so
/// `city` in `FROM world.city` is a table even though it follows a dot.
pub fn classify(tokens: &[Token], index: usize, tree: &ScopeTree) -> Reference {
    let Some(token) = tokens.get(index) else {
        return Reference::Unresolvable;
    };

    if let Some((scope_id, table_index)) = tree.table_at_token(index) {
        return Reference::TableName {
            scope_id,
            table_index,
        };
    }

    let next = tokens.get(index + 1);
    let qualifier = index
        .checked_sub(2)
        .filter(|&q| is_member_dot(tokens, q + 1))
        .map(|q| tokens[q].text.clone());

    match token.kind {
        TokenKind::Identifier | TokenKind::QuotedIdentifier => {
            if is_member_dot(tokens, index + 1) {
                return Reference::Qualifier {
                    name: token.text.clone(),
                };
            }
            if let Some(qualifier) = qualifier {
                return Reference::Member {
                    qualifier,
                    member: Member::Column(token.text.clone()),
                };
            }
            // Function names: COUNT(, COALESCE(
            if next.is_some_and(|t| t.kind == TokenKind::LParen) {
                return Reference::Unresolvable;
            }
            Reference::Column {
                name: token.text.clone(),
            }
        }
        TokenKind::Star => match qualifier {
            Some(qualifier) => Reference::Member {
                qualifier,
                member: Member::Wildcard,
            },
            None => Reference::Unresolvable,
        },
        _ => Reference::Unresolvable,
    }
}

/// Locate and classify the token under `position`
pub fn locate_reference(parsed: &ParsedSql, tree: &ScopeTree, position: Position) -> Option<Located> {
    let index = locate(&parsed.tokens, position)?;
    let token = &parsed.tokens[index];
    let reference = classify(&parsed.tokens, index, tree);
    tracing::trace!(%position, token = %token.text, ?reference, "located token");
    Some(Located {
        token: index,
        span: token.span,
        reference,
    })
}
