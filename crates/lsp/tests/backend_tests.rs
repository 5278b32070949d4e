// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! LspBackend integration tests
//!
//! Calls the `LanguageServer` methods directly on the backend, covering the
//! document lifecycle, hover and configuration commands.

use std::sync::Arc;

use serde_json::{Value, json};
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, LspService};

use sqlsight_lsp::{LspBackend, SHOW_CONNECTIONS_COMMAND, SWITCH_CONNECTION_COMMAND};
use sqlsight_syntax::SqlDialect;

fn uri() -> Url {
    Url::parse("file:///world.sql").unwrap()
}

fn settings() -> Value {
    json!({
        "sqlsight": {
            "connections": [
                { "alias": "world", "driver": "mock" },
                { "alias": "inline", "driver": "static", "tables": { "users": ["id", "email"] } }
            ]
        }
    })
}

async fn initialize(backend: &LspBackend, options: Option<Value>) -> InitializeResult {
    backend
        .initialize(InitializeParams {
            initialization_options: options,
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn open(backend: &LspBackend, text: &str, language_id: &str) {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri(),
                language_id: language_id.to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;
}

async fn hover(backend: &LspBackend, line: u32, character: u32) -> Option<Hover> {
    backend
        .hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri() },
                position: Position::new(line, character),
            },
            work_done_progress_params: Default::default(),
        })
        .await
        .unwrap()
}

fn hover_text(hover: Option<Hover>) -> String {
    match hover.map(|h| h.contents) {
        Some(HoverContents::Markup(markup)) => markup.value,
        Some(other) => panic!("unexpected hover contents: {:?}", other),
        None => String::new(),
    }
}

async fn execute(backend: &LspBackend, command: &str, arguments: Vec<Value>) -> tower_lsp::jsonrpc::Result<Option<Value>> {
    backend
        .execute_command(ExecuteCommandParams {
            command: command.to_string(),
            arguments,
            work_done_progress_params: Default::default(),
        })
        .await
}

#[tokio::test]
async fn test_initialize_capabilities() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let result = initialize(service.inner(), None).await;

    assert_eq!(
        result.capabilities.text_document_sync,
        Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL))
    );
    assert_eq!(
        result.capabilities.hover_provider,
        Some(HoverProviderCapability::Simple(true))
    );
    let commands = result.capabilities.execute_command_provider.unwrap().commands;
    assert!(commands.contains(&SWITCH_CONNECTION_COMMAND.to_string()));
    assert_eq!(result.server_info.unwrap().name, "sqlsight");
}

#[tokio::test]
async fn test_open_and_hover() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT ci.ID, ci.Name\nFROM city AS ci", "mysql").await;

    let result = hover(backend, 0, 18).await.unwrap();
    assert_eq!(
        result.contents,
        HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: "city.Name column".to_string(),
        })
    );
    assert_eq!(
        result.range,
        Some(Range::new(Position::new(0, 17), Position::new(0, 21)))
    );

    assert_eq!(hover_text(hover(backend, 1, 14).await), "city table");
    assert!(hover(backend, 0, 6).await.is_none());
}

#[tokio::test]
async fn test_incremental_change_reanalyzes() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT Name FROM city", "sql").await;
    assert_eq!(hover_text(hover(backend, 0, 8).await), "city.Name column");

    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 17), Position::new(0, 21))),
                range_length: None,
                text: "country".to_string(),
            }],
        })
        .await;

    let snapshot = backend.snapshots().get(&uri()).await.unwrap();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.text, "SELECT Name FROM country");
    assert_eq!(hover_text(hover(backend, 0, 8).await), "country.Name column");
}

#[tokio::test]
async fn test_close_drops_snapshot() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT Name FROM city", "sql").await;
    let snapshot = backend.snapshots().get(&uri()).await.unwrap();

    backend
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri() },
        })
        .await;

    assert!(snapshot.cancel.is_cancelled());
    assert!(backend.snapshots().get(&uri()).await.is_none());
    assert!(!backend.documents().has_document(&uri()).await);
    assert!(hover(backend, 0, 8).await.is_none());
}

#[tokio::test]
async fn test_malformed_document_has_no_hover() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT Name FROM city WHERE Name = 'Kab", "sql").await;
    assert!(hover(backend, 0, 8).await.is_none());
}

#[tokio::test]
async fn test_initialization_options_and_switch_connection() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, Some(settings())).await;
    assert_eq!(backend.catalog_generation().await, 1);

    open(backend, "SELECT u.email FROM users u", "postgresql").await;
    assert_eq!(hover_text(hover(backend, 0, 10).await), "");

    let switched = execute(backend, SWITCH_CONNECTION_COMMAND, vec![json!("inline")])
        .await
        .unwrap();
    assert_eq!(switched, Some(json!("inline")));
    assert_eq!(backend.catalog_generation().await, 2);
    assert_eq!(hover_text(hover(backend, 0, 10).await), "users.email column");

    let listing = execute(backend, SHOW_CONNECTIONS_COMMAND, vec![]).await.unwrap();
    let listing = listing.unwrap();
    let lines: Vec<&str> = listing.as_str().unwrap().lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("* 1 inline"));

    // Back by index
    execute(backend, SWITCH_CONNECTION_COMMAND, vec![json!(0)]).await.unwrap();
    assert_eq!(hover_text(hover(backend, 0, 10).await), "");
}

#[tokio::test]
async fn test_switch_connection_rejects_bad_arguments() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, Some(settings())).await;

    assert!(execute(backend, SWITCH_CONNECTION_COMMAND, vec![]).await.is_err());
    assert!(execute(backend, SWITCH_CONNECTION_COMMAND, vec![json!("prod")]).await.is_err());
    assert!(execute(backend, SWITCH_CONNECTION_COMMAND, vec![json!(7)]).await.is_err());
    assert!(execute(backend, "sqlsight.unknown", vec![]).await.is_err());
    assert_eq!(backend.get_config().await.active_connection, 0);
}

#[tokio::test]
async fn test_did_change_configuration() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT u.email FROM users u", "sql").await;

    let mut settings = settings();
    settings["sqlsight"]["activeConnection"] = json!(1);
    backend
        .did_change_configuration(DidChangeConfigurationParams { settings })
        .await;
    assert_eq!(hover_text(hover(backend, 0, 10).await), "users.email column");

    // Invalid settings leave the configuration alone
    backend
        .did_change_configuration(DidChangeConfigurationParams {
            settings: json!({ "sqlsight": { "activeConnection": 4, "connections": [] , "queryTimeoutSecs": 0 } }),
        })
        .await;
    assert_eq!(backend.get_config().await.active_connection, 1);
}

#[tokio::test]
async fn test_switch_connection_keeps_snapshot() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, Some(settings())).await;
    open(backend, "SELECT u.email FROM users u", "mysql").await;
    let before = backend.snapshots().get(&uri()).await.unwrap();

    execute(backend, SWITCH_CONNECTION_COMMAND, vec![json!("inline")]).await.unwrap();

    let after = backend.snapshots().get(&uri()).await.unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!before.cancel.is_cancelled());
    // Columns are refetched from the new catalog on the same snapshot
    assert_eq!(hover_text(hover(backend, 0, 10).await), "users.email column");
}

#[tokio::test]
async fn test_dialect_change_reanalyzes() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, Some(settings())).await;
    open(backend, "SELECT \"co\".\"Name\" FROM country AS \"co\"", "sql").await;
    let before = backend.snapshots().get(&uri()).await.unwrap();
    assert_eq!(before.dialect, SqlDialect::MySQL);

    let mut settings = settings();
    settings["sqlsight"]["dialect"] = json!("postgresql");
    backend
        .did_change_configuration(DidChangeConfigurationParams { settings })
        .await;

    let after = backend.snapshots().get(&uri()).await.unwrap();
    assert_eq!(after.dialect, SqlDialect::PostgreSQL);
    assert_eq!(after.version, before.version);
    assert!(before.cancel.is_cancelled());
    assert_eq!(hover_text(hover(backend, 0, 14).await), "country.Name column");
}

#[tokio::test]
async fn test_hover_after_wide_character() {
    let (service, _socket) = LspService::new(LspBackend::new);
    let backend = service.inner();
    initialize(backend, None).await;
    open(backend, "SELECT '\u{1F600}', Name FROM city", "sql").await;

    // Name spans characters 12..16, UTF-16 units 13..17
    let result = hover(backend, 0, 13).await.unwrap();
    assert_eq!(
        result.range,
        Some(Range::new(Position::new(0, 13), Position::new(0, 17)))
    );
    assert_eq!(hover_text(hover(backend, 0, 17).await), "city.Name column");
    assert_eq!(hover_text(hover(backend, 0, 24).await), "city table");
}
