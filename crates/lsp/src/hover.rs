// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Hover Information Provider
//!
//! Answers "what is under the cursor" against the published snapshot of a
//! document.
//!
//! ## Pipeline
//!
//! 1. Take the document's current [`Snapshot`](crate::analysis::Snapshot)
//! 2. Locate and classify the token under the cursor
//! 3. Resolve it against the innermost scope, fetching column lists through
//!    the active catalog on demand
//! 4. Format the resulting symbol
//!
//! ```sql
//! SELECT ci.Na|me FROM city AS ci
//! ```
//!
//! Hovering `Name` yields `city.Name column`; hovering `ci` yields
//! `city table`.

use std::sync::Arc;

use sqlsight_context::locate_reference;
use sqlsight_semantic::{ColumnSource, Resolver, SemanticError, SemanticResult, format_hover};
use sqlsight_syntax::{Position, Span};
use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::analysis::SnapshotStore;
use crate::catalog_manager::CatalogManager;

/// Hover text and the span of the token it describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub contents: String,
    pub span: Span,
}

/// Hover engine over published snapshots
pub struct HoverEngine {
    snapshots: Arc<SnapshotStore>,
    catalogs: Arc<RwLock<CatalogManager>>,
}

impl HoverEngine {
    pub fn new(snapshots: Arc<SnapshotStore>, catalogs: Arc<RwLock<CatalogManager>>) -> Self {
        Self {
            snapshots,
            catalogs,
        }
    }

    /// Hover text at a zero-based line and character column
    ///
    /// `version` pins the request to one document version; `None` uses the
    /// latest. Returns `None` when there is nothing to show, including when
    /// the document is unknown, the version does not match, the text could
    /// not be tokenized, or resolution failed.
    pub async fn hover_at(&self, uri: &Url, version: Option<i32>, line: u32, column: u32) -> Option<String> {
        match self.hover_info(uri, version, Position::new(line, column)).await {
            Ok(info) => info.map(|info| info.contents),
            Err(err) => {
                log_failure(uri, &err);
                None
            }
        }
    }

    /// Hover text together with the hovered token's span
    pub async fn hover_info(
        &self,
        uri: &Url,
        version: Option<i32>,
        position: Position,
    ) -> SemanticResult<Option<HoverInfo>> {
        let Some(snapshot) = self.snapshots.get(uri).await else {
            debug!(%uri, "hover on unknown document");
            return Ok(None);
        };
        if version.is_some_and(|v| v != snapshot.version) {
            debug!(%uri, requested = ?version, current = snapshot.version, "hover on stale version");
            return Ok(None);
        }
        let Some(parsed) = snapshot.parsed.as_ref() else {
            return Ok(None);
        };
        let Some(located) = locate_reference(parsed, &snapshot.scopes, position) else {
            return Ok(None);
        };

        let source = {
            let catalogs = self.catalogs.read().await;
            ColumnSource::new(catalogs.catalog(), Arc::clone(&snapshot.columns), catalogs.generation())
                .with_timeout(catalogs.query_timeout())
                .with_cancellation(snapshot.cancel.clone())
        };

        let symbol = Resolver::new(&snapshot.scopes, &source).resolve(&located).await?;
        let contents = format_hover(&symbol);
        debug!(%uri, %position, ?symbol, "hover resolved");

        if contents.is_empty() {
            return Ok(None);
        }
        Ok(Some(HoverInfo {
            contents,
            span: located.span,
        }))
    }
}

fn log_failure(uri: &Url, err: &SemanticError) {
    match err {
        SemanticError::Cancelled => debug!(%uri, "hover cancelled"),
        _ => warn!(%uri, error = %err, "hover failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Snapshot;
    use sqlsight_syntax::SqlDialect;
    use sqlsight_test_utils::MockCatalog;

    async fn engine_with(text: &str) -> (HoverEngine, Url) {
        let uri = Url::parse("file:///world.sql").unwrap();
        let snapshots = Arc::new(SnapshotStore::new());
        snapshots
            .publish(Snapshot::build(uri.clone(), 1, text.to_string(), SqlDialect::MySQL))
            .await;
        let catalogs = Arc::new(RwLock::new(CatalogManager::with_catalog(Arc::new(MockCatalog::world()))));
        (HoverEngine::new(snapshots, catalogs), uri)
    }

    #[tokio::test]
    async fn test_hover_at_column_and_table() {
        let (engine, uri) = engine_with("SELECT ci.ID, ci.Name FROM city AS ci").await;

        assert_eq!(engine.hover_at(&uri, Some(1), 0, 10).await.as_deref(), Some("city.ID column"));
        assert_eq!(engine.hover_at(&uri, None, 0, 7).await.as_deref(), Some("city table"));
        assert_eq!(engine.hover_at(&uri, None, 0, 12).await, None);
    }

    #[tokio::test]
    async fn test_hover_info_span() {
        let (engine, uri) = engine_with("SELECT ci.Name FROM city AS ci").await;
        let info = engine.hover_info(&uri, None, Position::new(0, 12)).await.unwrap().unwrap();
        assert_eq!(info.span, Span::new(Position::new(0, 10), Position::new(0, 14)));
    }

    #[tokio::test]
    async fn test_hover_version_mismatch() {
        let (engine, uri) = engine_with("SELECT ID FROM city").await;
        assert_eq!(engine.hover_at(&uri, Some(2), 0, 8).await, None);
        assert!(engine.hover_at(&uri, Some(1), 0, 8).await.is_some());
    }

    #[tokio::test]
    async fn test_hover_unknown_document() {
        let (engine, _) = engine_with("SELECT ID FROM city").await;
        let other = Url::parse("file:///other.sql").unwrap();
        assert_eq!(engine.hover_at(&other, None, 0, 8).await, None);
    }

    #[tokio::test]
    async fn test_hover_malformed_document() {
        let (engine, uri) = engine_with("SELECT ID FROM city WHERE Name = 'open").await;
        assert_eq!(engine.hover_at(&uri, None, 0, 8).await, None);
    }
}
