// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Secure Geo Data
//!
//! Encrypted storage of GeoJSON-like datasets per project, guarded by a
//! role/security-level access matrix and an audit trail.
//!
//! ```text
//! api::secure_geo → SecureGeoService → access check → PayloadCipher
//!                                    → GeoDatabase (redb) → audit archive
//! ```

pub mod access;
pub mod cipher;
pub mod error;
pub mod import;
pub mod record;
pub mod service;

pub use access::{accessible_levels, is_authorized, SecurityLevel};
pub use cipher::{CipherError, PayloadCipher};
pub use error::GeoError;
pub use import::resolve_import_path;
pub use record::{
    record_key, validate_project_id, AccessControl, AuditAction, AuditTrail, DataType,
    GeoAuditEntry, GeoMetadata, RetentionPolicy, SecureGeoRecord,
};
pub use service::{
    DeleteOptions, ExportFormat, GeoDataView, GeoExport, GeoResult, GeoStatus, GetOptions,
    ImportOptions, ImportSummary, MigrateOptions, MigrationFailure, MigrationReport,
    RecordStatus, RecordSummary, Requester, SecureGeoService, StoreOptions, UpdateOptions,
};
