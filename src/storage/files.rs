// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plain filesystem operations under the data directory.
//!
//! Everything written here is either non-sensitive (audit archive) or already
//! sealed by the payload cipher before it reaches disk. Record payloads are
//! never written through this module in plaintext.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::StoragePaths;

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Storage not initialized
    #[error("Storage not initialized")]
    NotInitialized,
    /// Data read back does not match what was written
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
    /// Generic serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage manager rooted at the data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl FileStorage {
    /// Create a new FileStorage instance.
    ///
    /// Does NOT initialize the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Check if storage is initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize the directory structure.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.root().to_path_buf(),
            self.paths.audit_dir(),
            self.paths.imports_dir(),
            self.paths.legacy_geo_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Check that the data directory is writable and reads back what it wrote.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }

        Ok(())
    }

    /// Append one line to a file, creating it (and its parents) if needed.
    ///
    /// The line is written with a single `write_all` on an append-mode handle
    /// so concurrent appenders never overwrite each other's lines.
    pub fn append_line(&self, path: impl AsRef<Path>, line: &[u8]) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::with_capacity(line.len() + 1);
        buffer.extend_from_slice(line);
        if !buffer.ends_with(b"\n") {
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(&buffer)?;
        file.flush()?;
        Ok(())
    }

    /// Read raw bytes from a file.
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// List files in a directory whose extension is one of `extensions`.
    ///
    /// Returned paths are sorted so callers process them deterministically.
    pub fn list_files(
        &self,
        dir: impl AsRef<Path>,
        extensions: &[&str],
    ) -> StorageResult<Vec<PathBuf>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
