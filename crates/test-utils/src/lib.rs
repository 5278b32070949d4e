// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for SQLSight
//!
//! This crate provides common testing components including:
//! - A mock catalog that can fail, stall and count calls
//! - A text format for hover expectations with a cursor marker
//! - Test fixtures over the MySQL `world` sample schema

pub mod fixtures;
pub mod hover_case;
pub mod mock_catalog;

// Re-exports for convenience
pub use fixtures::{SqlFixtures, WORLD_HOVER_CASES, world_hover_cases};
pub use hover_case::{CURSOR_MARKER, HoverCase, ParseError, parse_case_file, parse_cases, split_cursor};
pub use mock_catalog::{MockCatalog, MockCatalogBuilder};
