// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data directory (`DATA_DIR`).
//!
//! ## Security Model
//!
//! - Geo payloads are sealed with AES-256-GCM before they reach this layer
//! - The record database only ever sees ciphertext plus derived metadata
//! - The audit archive is append-only and holds no payload data
//!
//! ## Storage Layout
//!
//! ```text
//! <DATA_DIR>/
//!   secure_geo.redb          # Encrypted secure geo records
//!   imports/                 # Files the HTTP import endpoint may read
//!   legacy_geo/              # Plaintext files awaiting migration
//!   audit/
//!     {date}/events.jsonl    # Daily audit archive
//! ```

pub mod audit;
pub mod files;
pub mod geo_database;
pub mod paths;

pub use audit::{AuditEvent, AuditEventType, AuditRepository, ARCHIVE_DATE_FORMAT};
pub use files::{FileStorage, StorageError, StorageResult};
pub use geo_database::{GeoDatabase, GeoDbError, GeoDbResult};
pub use paths::StoragePaths;
