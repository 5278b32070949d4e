// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Per-version analysis snapshots
//!
//! Every text change produces a new [`Snapshot`]: the tokens, statement
//! outline and scope tree of one document version. Snapshots are immutable
//! once published; requests clone the `Arc` and read without holding any
//! lock.
//!
//! ```text
//! did_open / did_change ──► Snapshot::build ──► SnapshotStore::publish
//!                                                    │ (cancels the old one)
//! hover ──► SnapshotStore::get ──► Arc<Snapshot> ────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use sqlsight_context::ScopeBuilder;
use sqlsight_semantic::{ColumnCache, ScopeTree};
use sqlsight_syntax::{ParsedSql, SqlDialect, parse};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

/// Analysis of one document version
#[derive(Debug)]
pub struct Snapshot {
    pub uri: Url,
    pub version: i32,
    pub dialect: SqlDialect,
    pub text: String,
    /// `None` when the text could not be tokenized
    pub parsed: Option<ParsedSql>,
    pub scopes: ScopeTree,
    /// Column lists fetched while resolving against this snapshot
    pub columns: Arc<ColumnCache>,
    /// Cancelled when the snapshot is superseded or its document closes
    pub cancel: CancellationToken,
}

impl Snapshot {
    pub fn build(uri: Url, version: i32, text: String, dialect: SqlDialect) -> Self {
        let (parsed, scopes) = match parse(&text, dialect) {
            Ok(parsed) => {
                let scopes = ScopeBuilder::build(&parsed);
                debug!(
                    %uri,
                    version,
                    tokens = parsed.tokens.len(),
                    scopes = scopes.scope_count(),
                    "document analyzed"
                );
                (Some(parsed), scopes)
            }
            Err(err) => {
                warn!(%uri, version, error = %err, "document could not be tokenized");
                (None, ScopeTree::new())
            }
        };

        Self {
            uri,
            version,
            dialect,
            text,
            parsed,
            scopes,
            columns: Arc::new(ColumnCache::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Whether the document could not be tokenized
    pub fn is_malformed(&self) -> bool {
        self.parsed.is_none()
    }
}

/// Latest snapshot per open document
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<Url, Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot unless a newer version is already stored
    ///
    /// The replaced snapshot is cancelled. Returns whether `snapshot` was
    /// stored.
    pub async fn publish(&self, snapshot: Snapshot) -> bool {
        let mut snapshots = self.snapshots.write().await;

        if let Some(current) = snapshots.get(&snapshot.uri) {
            if current.version > snapshot.version {
                debug!(
                    uri = %snapshot.uri,
                    stale = snapshot.version,
                    current = current.version,
                    "dropping stale snapshot"
                );
                return false;
            }
        }

        let uri = snapshot.uri.clone();
        if let Some(previous) = snapshots.insert(uri, Arc::new(snapshot)) {
            previous.cancel.cancel();
        }
        true
    }

    pub async fn get(&self, uri: &Url) -> Option<Arc<Snapshot>> {
        self.snapshots.read().await.get(uri).cloned()
    }

    /// Drop a document's snapshot and cancel work running against it
    pub async fn remove(&self, uri: &Url) -> bool {
        match self.snapshots.write().await.remove(uri) {
            Some(snapshot) => {
                snapshot.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}
