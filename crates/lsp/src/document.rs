// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document Management
//!
//! Open documents keyed by URI, with text held in a [`Rope`] so incremental
//! edits stay cheap on large files.
//!
//! LSP positions count columns in UTF-16 code units. Token spans count
//! characters, so positions are converted through the rope on the way in
//! ([`Document::to_char_column`]) and on the way out
//! ([`Document::to_utf16_column`]).
//!
//! ## Example
//!
//! ```rust
//! use sqlsight_lsp::DocumentStore;
//! use tower_lsp::lsp_types::Url;
//!
//! # tokio_test::block_on(async {
//! let store = DocumentStore::new();
//! let uri = Url::parse("file:///world.sql").unwrap();
//!
//! store.open_document(uri.clone(), "SELECT ID FROM city".to_string(), 1, "mysql".to_string()).await;
//! let doc = store.get_document(&uri).await.unwrap();
//! assert_eq!(doc.get_line(0).as_deref(), Some("SELECT ID FROM city"));
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url, VersionedTextDocumentIdentifier};

/// A document managed by the LSP server
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    /// Language identifier (e.g., "sql", "mysql", "postgresql")
    language_id: String,
    version: i32,
    content: Rope,
}

impl Document {
    pub fn new(uri: Url, content: String, version: i32, language_id: String) -> Self {
        Self {
            uri,
            language_id,
            version,
            content: Rope::from_str(&content),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.content.len_lines()
    }

    /// Get the full document content as a string
    pub fn get_content(&self) -> String {
        self.content.to_string()
    }

    /// Get a line of text, without its line ending
    pub fn get_line(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }

        let line_with_ending = self.content.line(line).to_string();
        Some(line_with_ending.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Length of a line in characters, without its line ending
    fn line_len(&self, line: usize) -> usize {
        let slice = self.content.line(line);
        let mut len = slice.len_chars();
        while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        len
    }

    /// Character column of an LSP position
    ///
    /// The column may point one past the last character of the line (the
    /// insertion point before the line ending) but not beyond. A column in
    /// the middle of a surrogate pair maps to the character it splits.
    pub fn to_char_column(&self, position: Position) -> Option<u32> {
        let line = position.line as usize;
        if line >= self.line_count() {
            return None;
        }

        let slice = self.content.line(line);
        let line_len = self.line_len(line);
        let units = position.character as usize;
        if units > slice.slice(..line_len).len_utf16_cu() {
            return None;
        }
        Some(slice.utf16_cu_to_char(units) as u32)
    }

    /// UTF-16 column of a character column, clamped to the line
    pub fn to_utf16_column(&self, line: u32, column: u32) -> u32 {
        let line = line as usize;
        if line >= self.line_count() {
            return column;
        }
        let column = (column as usize).min(self.line_len(line));
        self.content.line(line).char_to_utf16_cu(column) as u32
    }

    /// Character offset of an LSP position
    pub fn offset(&self, position: Position) -> Option<usize> {
        let column = self.to_char_column(position)?;
        Some(self.content.line_to_char(position.line as usize) + column as usize)
    }

    /// Apply content changes in order, then move to `new_version`
    ///
    /// A change without a range replaces the whole document. A change with a
    /// range replaces that range; `range_length` is ignored since it is
    /// deprecated in the protocol.
    pub fn apply_changes(
        &mut self,
        changes: &[TextDocumentContentChangeEvent],
        new_version: i32,
    ) -> Result<(), DocumentError> {
        for change in changes {
            match change.range {
                Some(range) => {
                    let invalid = || DocumentError::InvalidRange {
                        start: (range.start.line as usize, range.start.character as usize),
                        end: (range.end.line as usize, range.end.character as usize),
                    };
                    let start_char = self.offset(range.start).ok_or_else(invalid)?;
                    let end_char = self.offset(range.end).ok_or_else(invalid)?;
                    if start_char > end_char {
                        return Err(invalid());
                    }

                    self.content.remove(start_char..end_char);
                    self.content.insert(start_char, &change.text);
                }
                None => {
                    self.content = Rope::from_str(&change.text);
                }
            }
        }

        self.version = new_version;
        Ok(())
    }
}

/// Document store for managing multiple documents
///
/// Thread-safe store for all open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<Url, Document>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any previous one with the same URI
    pub async fn open_document(
        &self,
        uri: Url,
        content: String,
        version: i32,
        language_id: String,
    ) -> Document {
        let document = Document::new(uri.clone(), content, version, language_id);
        self.documents.write().await.insert(uri, document.clone());
        document
    }

    /// Close a document; false if it was not open
    pub async fn close_document(&self, uri: &Url) -> bool {
        self.documents.write().await.remove(uri).is_some()
    }

    /// Apply changes and return the updated document
    ///
    /// The document is left untouched when any change fails to apply.
    pub async fn update_document(
        &self,
        identifier: &VersionedTextDocumentIdentifier,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<Document, DocumentError> {
        let mut docs = self.documents.write().await;

        let document = docs
            .get_mut(&identifier.uri)
            .ok_or_else(|| DocumentError::DocumentNotFound(identifier.uri.clone()))?;

        let mut updated = document.clone();
        updated.apply_changes(changes, identifier.version)?;
        *document = updated.clone();

        Ok(updated)
    }

    pub async fn get_document(&self, uri: &Url) -> Option<Document> {
        self.documents.read().await.get(uri).cloned()
    }

    pub async fn has_document(&self, uri: &Url) -> bool {
        self.documents.read().await.contains_key(uri)
    }

    /// Snapshot of every open document
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.read().await.values().cloned().collect()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

/// Document-related errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Url),

    /// Invalid range for text operation
    #[error("Invalid range: start={start:?}, end={end:?}")]
    InvalidRange {
        start: (usize, usize),
        end: (usize, usize),
    },
}
