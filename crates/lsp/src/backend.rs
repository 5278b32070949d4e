// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LSP Backend Implementation
//!
//! This module provides the main LSP server backend using tower-lsp.
//!
//! ## Overview
//!
//! The backend handles:
//! - Document lifecycle (open, change, close) with incremental sync
//! - Re-analysis of a document on every change
//! - Conversion between LSP UTF-16 columns and the character columns of
//!   token spans
//! - Hover
//! - Configuration changes and connection switching
//!
//! ## Architecture
//!
//! ```text
//! Client → LSP Backend → Document Store
//!                ↓
//!         Snapshot Store ← analysis per version
//!                ↓
//!          Hover Engine → Catalog Manager → Catalog
//! ```
//!
//! ## Commands
//!
//! - `sqlsight.switchConnection <index | alias>`: make another configured
//!   connection active
//! - `sqlsight.showConnections`: list configured connections, the active one
//!   marked with `*`

use std::sync::Arc;

use serde_json::Value;
use sqlsight_catalog::CatalogError;
use sqlsight_syntax::Span;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::analysis::{Snapshot, SnapshotStore};
use crate::catalog_manager::CatalogManager;
use crate::config::{ConfigError, EngineConfig};
use crate::document::{Document, DocumentError, DocumentStore};
use crate::hover::HoverEngine;

/// Command selecting the active connection
pub const SWITCH_CONNECTION_COMMAND: &str = "sqlsight.switchConnection";

/// Command listing the configured connections
pub const SHOW_CONNECTIONS_COMMAND: &str = "sqlsight.showConnections";

/// LSP backend implementation
///
/// Main entry point for all LSP protocol operations.
pub struct LspBackend {
    /// LSP client for sending notifications and requests
    client: Client,

    /// Document store for managing open documents
    documents: Arc<DocumentStore>,

    /// Latest analysis per document
    snapshots: Arc<SnapshotStore>,

    /// Engine configuration
    config: Arc<RwLock<EngineConfig>>,

    /// Catalog for the active connection
    catalogs: Arc<RwLock<CatalogManager>>,

    hover: HoverEngine,
}

impl LspBackend {
    /// Create a backend with the default configuration
    pub fn new(client: Client) -> Self {
        Self::with_config(client, EngineConfig::default())
    }

    /// Create a backend with a configuration loaded up front
    ///
    /// The catalog for the configured connection is created during
    /// `initialize`.
    pub fn with_config(client: Client, config: EngineConfig) -> Self {
        let snapshots = Arc::new(SnapshotStore::new());
        let catalogs = Arc::new(RwLock::new(CatalogManager::new()));
        let hover = HoverEngine::new(Arc::clone(&snapshots), Arc::clone(&catalogs));

        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            snapshots,
            config: Arc::new(RwLock::new(config)),
            catalogs,
            hover,
        }
    }

    /// Get the document store
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn hover_engine(&self) -> &HoverEngine {
        &self.hover
    }

    /// Get the engine configuration
    pub async fn get_config(&self) -> EngineConfig {
        self.config.read().await.clone()
    }

    pub async fn catalog_generation(&self) -> u64 {
        self.catalogs.read().await.generation()
    }

    /// Install a new configuration
    ///
    /// The catalog is switched first; if that fails nothing changes. A new
    /// catalog only bumps the catalog generation, so snapshots keep their
    /// scopes and refetch columns lazily. Documents are re-analyzed only when
    /// their dialect changed.
    pub async fn set_config(&self, config: EngineConfig) -> std::result::Result<(), LspError> {
        config.validate()?;
        self.catalogs.write().await.apply(&config).await?;
        info!(
            connections = config.connections.len(),
            active = config.active_connection,
            "engine configuration updated"
        );
        *self.config.write().await = config;
        self.reanalyze_stale_dialects().await;
        Ok(())
    }

    /// Make connection `target` active, by index or alias
    pub async fn switch_connection(&self, target: &Value) -> std::result::Result<String, LspError> {
        let mut config = self.get_config().await;
        let index = match target {
            Value::Number(n) => n
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| LspError::InvalidArguments(format!("bad connection index {}", n)))?,
            Value::String(alias) => config
                .connection_index(alias)
                .or_else(|| alias.parse().ok())
                .ok_or_else(|| ConfigError::UnknownConnection(alias.clone()))?,
            other => {
                return Err(LspError::InvalidArguments(format!(
                    "expected a connection index or alias, got {}",
                    other
                )));
            }
        };

        let name = config.switch_connection(index)?.display_name().to_string();
        self.set_config(config).await?;
        Ok(name)
    }

    /// Configured connections, one per line, the active one marked with `*`
    pub async fn describe_connections(&self) -> String {
        let config = self.config.read().await;
        config
            .connections
            .iter()
            .enumerate()
            .map(|(index, connection)| {
                let marker = if index == config.active_connection { "*" } else { " " };
                format!("{} {} {} {:?}", marker, index, connection.display_name(), connection.driver)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build and publish the snapshot for a document version
    async fn analyze(&self, document: &Document) {
        let dialect = self.config.read().await.dialect_for(document.language_id());
        let snapshot = Snapshot::build(
            document.uri().clone(),
            document.version(),
            document.get_content(),
            dialect,
        );
        let malformed = snapshot.is_malformed();
        if self.snapshots.publish(snapshot).await && malformed {
            self.log_message(
                &format!("Could not tokenize {}; hover is unavailable until it is fixed", document.uri()),
                MessageType::WARNING,
            )
            .await;
        }
    }

    async fn reanalyze_stale_dialects(&self) {
        for document in self.documents.documents().await {
            let dialect = self.config.read().await.dialect_for(document.language_id());
            let current = self.snapshots.get(document.uri()).await;
            if current.is_some_and(|s| s.version == document.version() && s.dialect == dialect) {
                continue;
            }
            debug!(uri = %document.uri(), %dialect, "re-analyzing document");
            self.analyze(&document).await;
        }
    }

    /// Log a message to the client
    async fn log_message(&self, message: &str, message_type: MessageType) {
        self.client.log_message(message_type, message).await;
    }

    /// Show a message to the user
    async fn show_message(&self, message: &str, message_type: MessageType) {
        self.client.show_message(message_type, message).await;
    }
}

/// LSP range of a token span, in UTF-16 columns of `document`
pub fn span_to_range(document: &Document, span: Span) -> Range {
    Range {
        start: Position::new(span.start.line, document.to_utf16_column(span.start.line, span.start.column)),
        end: Position::new(span.end.line, document.to_utf16_column(span.end.line, span.end.column)),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LspBackend {
    /// Initialize the LSP server
    ///
    /// `initializationOptions` may carry the same settings payload as
    /// `workspace/didChangeConfiguration`.
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing LSP server");
        info!("Client info: {:?}", params.client_info);

        let from_client = match params.initialization_options.as_ref() {
            Some(options) => match EngineConfig::from_lsp_settings(options) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring invalid initialization options: {}", e);
                    None
                }
            },
            None => None,
        };
        let config = match from_client {
            Some(config) => config,
            None => self.get_config().await,
        };

        if let Err(e) = self.set_config(config).await {
            error!("Failed to apply configuration: {}", e);
            self.log_message(
                &format!("Falling back to the built-in schema: {}", e),
                MessageType::WARNING,
            )
            .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        SWITCH_CONNECTION_COMMAND.to_string(),
                        SHOW_CONNECTIONS_COMMAND.to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: Some(false),
                    },
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: crate::SERVER_NAME.to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("LSP server initialized successfully");
        let active = self
            .catalogs
            .read()
            .await
            .active_connection()
            .unwrap_or("built-in world schema")
            .to_string();
        self.log_message(&format!("SQLSight ready, using {}", active), MessageType::INFO)
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down LSP server");
        for document in self.documents.documents().await {
            self.snapshots.remove(document.uri()).await;
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        info!(
            "Document opened: uri={}, language={}, version={}",
            doc.uri, doc.language_id, doc.version
        );

        let document = self
            .documents
            .open_document(doc.uri, doc.text, doc.version, doc.language_id)
            .await;
        self.analyze(&document).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let identifier = params.text_document;
        debug!(
            "Document changed: uri={}, version={}, changes={}",
            identifier.uri,
            identifier.version,
            params.content_changes.len()
        );

        match self
            .documents
            .update_document(&identifier, &params.content_changes)
            .await
        {
            Ok(document) => self.analyze(&document).await,
            Err(DocumentError::DocumentNotFound(uri)) => {
                warn!("Document not found for change: {}", uri);
            }
            Err(e) => {
                error!("Failed to update document: {}", e);
                self.show_message(
                    &format!("Failed to update document: {}", e),
                    MessageType::ERROR,
                )
                .await;
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document closed: uri={}", uri);

        self.snapshots.remove(&uri).await;
        if !self.documents.close_document(&uri).await {
            warn!("Document not found for close: {}", uri);
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!(
            "Hover requested: uri={}, line={}, col={}",
            uri, position.line, position.character
        );

        let Some(document) = self.documents.get_document(&uri).await else {
            return Ok(None);
        };
        let Some(column) = document.to_char_column(position) else {
            return Ok(None);
        };

        let cursor = sqlsight_syntax::Position::new(position.line, column);
        match self.hover.hover_info(&uri, None, cursor).await {
            Ok(Some(info)) => Ok(Some(Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: info.contents,
                }),
                range: Some(span_to_range(&document, info.span)),
            })),
            Ok(None) => Ok(None),
            Err(e) => {
                debug!("Hover unavailable: {}", e);
                Ok(None)
            }
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        debug!("Configuration changed: {:?}", params.settings);

        let config = match EngineConfig::from_lsp_settings(&params.settings) {
            Ok(Some(config)) => config,
            Ok(None) => return,
            Err(e) => {
                warn!("Invalid configuration: {}", e);
                self.show_message(&format!("Invalid SQLSight settings: {}", e), MessageType::ERROR)
                    .await;
                return;
            }
        };

        if let Err(e) = self.set_config(config).await {
            error!("Failed to apply configuration: {}", e);
            self.show_message(&format!("Failed to apply settings: {}", e), MessageType::ERROR)
                .await;
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        info!("Execute command: {}", params.command);

        match params.command.as_str() {
            SWITCH_CONNECTION_COMMAND => {
                let Some(target) = params.arguments.first() else {
                    return Err(tower_lsp::jsonrpc::Error::invalid_params(
                        "switchConnection expects a connection index or alias",
                    ));
                };
                match self.switch_connection(target).await {
                    Ok(name) => {
                        self.show_message(&format!("Switched to connection {}", name), MessageType::INFO)
                            .await;
                        Ok(Some(Value::String(name)))
                    }
                    Err(e) => Err(tower_lsp::jsonrpc::Error::invalid_params(e.to_string())),
                }
            }
            SHOW_CONNECTIONS_COMMAND => Ok(Some(Value::String(self.describe_connections().await))),
            other => Err(tower_lsp::jsonrpc::Error::invalid_params(format!(
                "unknown command: {}",
                other
            ))),
        }
    }
}

/// LSP backend errors
#[derive(Debug, thiserror::Error)]
pub enum LspError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document error
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Malformed command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
