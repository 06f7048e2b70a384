// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk data layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent state.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Secure Geo Records ==========

    /// Embedded database holding encrypted secure geo records.
    pub fn geo_database(&self) -> PathBuf {
        self.root.join("secure_geo.redb")
    }

    /// Directory that HTTP import requests may read from.
    pub fn imports_dir(&self) -> PathBuf {
        self.root.join("imports")
    }

    /// Directory scanned by the legacy plaintext migration.
    pub fn legacy_geo_dir(&self) -> PathBuf {
        self.root.join("legacy_geo")
    }

    // ========== Audit Archive Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}
