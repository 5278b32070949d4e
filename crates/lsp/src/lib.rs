// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQLSight - Language Server Protocol
//!
//! This crate provides the LSP server for SQLSight: hover that tells which
//! table or column an identifier refers to, through aliases, joins, derived
//! tables and CTEs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Client (VS Code, etc.)          │
//! └──────────────┬──────────────────────────┘
//!                │ LSP Protocol
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │         LSP Backend (tower-lsp)         │
//! ├─────────────────────────────────────────┤
//! │  • did_open / did_change / did_close    │
//! │  • hover / execute_command              │
//! └──────────────┬──────────────────────────┘
//!                │
//!         ┌──────┴──────┬────────────────┐
//!         ↓             ↓                ↓
//! ┌────────────┐ ┌──────────┐  ┌──────────────┐
//! │   Config   │ │ Document │  │   Snapshot   │
//! │  Catalogs  │ │   Store  │  │ Store, Hover │
//! └────────────┘ └──────────┘  └──────────────┘
//! ```
//!
//! ## Starting the Server
//!
//! ```rust,no_run
//! use sqlsight_lsp::LspBackend;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::new(LspBackend::new);
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! ## Error Handling
//!
//! Nothing a document or a database does stops the server:
//! - Untokenizable text → no hover for that version, logged once
//! - Catalog unreachable → tables it cannot describe simply have no columns
//! - Invalid settings → reported to the user, previous settings kept

pub mod analysis;
pub mod backend;
pub mod catalog_manager;
pub mod config;
pub mod document;
pub mod hover;

// Re-exports for convenience
pub use analysis::{Snapshot, SnapshotStore};
pub use backend::{LspBackend, LspError, SHOW_CONNECTIONS_COMMAND, SWITCH_CONNECTION_COMMAND};
pub use catalog_manager::CatalogManager;
pub use config::{ConfigError, ConnectionConfig, Driver, EngineConfig};
pub use document::{Document, DocumentError, DocumentStore};
pub use hover::{HoverEngine, HoverInfo};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const SERVER_NAME: &str = "sqlsight";
