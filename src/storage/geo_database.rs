// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `secure_geo_records`: `<projectId>|<dataType>` → serialized SecureGeoRecord
//!
//! The key is the uniqueness constraint: at most one record exists per
//! project and data type. Read-modify-write goes through [`GeoDatabase::update`],
//! which holds a single write transaction for the whole cycle. redb allows one
//! writer at a time, so concurrent updates and audit appends serialize instead
//! of overwriting each other.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::geo::{record_key, DataType, SecureGeoRecord};

/// Primary table: record key → serialized SecureGeoRecord (JSON bytes).
const SECURE_GEO_RECORDS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("secure_geo_records");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GeoDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("record has no encrypted payload: {0}")]
    EmptyPayload(String),
}

pub type GeoDbResult<T> = Result<T, GeoDbError>;

/// Records must never be stored without ciphertext.
fn ensure_payload(record: &SecureGeoRecord) -> GeoDbResult<()> {
    if record.encrypted_payload.is_empty() {
        return Err(GeoDbError::EmptyPayload(record.key()));
    }
    Ok(())
}

// =============================================================================
// GeoDatabase
// =============================================================================

/// Embedded ACID store for secure geo records.
pub struct GeoDatabase {
    db: Database,
}

impl GeoDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> GeoDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SECURE_GEO_RECORDS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a record whose key must not exist yet.
    pub fn insert_new(&self, record: &SecureGeoRecord) -> GeoDbResult<()> {
        ensure_payload(record)?;
        let key = record.key();
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SECURE_GEO_RECORDS)?;
            if table.get(key.as_str())?.is_some() {
                drop(table);
                write_txn.abort()?;
                return Err(GeoDbError::AlreadyExists(key));
            }
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single record.
    pub fn get(
        &self,
        project_id: &str,
        data_type: DataType,
    ) -> GeoDbResult<Option<SecureGeoRecord>> {
        let key = record_key(project_id, data_type);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECURE_GEO_RECORDS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All records of a project, ordered by data type name.
    pub fn list_by_project(&self, project_id: &str) -> GeoDbResult<Vec<SecureGeoRecord>> {
        // '}' sorts directly after '|', so this range covers exactly "<project_id>|*".
        let start = format!("{project_id}|");
        let end = format!("{project_id}}}");

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECURE_GEO_RECORDS)?;

        let mut records = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())? {
            let (_key, value) = entry?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Load, mutate and store a record in one write transaction.
    ///
    /// If `apply` returns an error the transaction is aborted and nothing is
    /// written. The mutated record is checked for a payload before it is stored.
    pub fn update<T, E>(
        &self,
        project_id: &str,
        data_type: DataType,
        apply: impl FnOnce(&mut SecureGeoRecord) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<GeoDbError>,
    {
        let key = record_key(project_id, data_type);
        let write_txn = self.db.begin_write().map_err(GeoDbError::from)?;

        let outcome = {
            let mut table = write_txn
                .open_table(SECURE_GEO_RECORDS)
                .map_err(GeoDbError::from)?;

            let existing = table
                .get(key.as_str())
                .map_err(GeoDbError::from)?
                .map(|value| value.value().to_vec());

            match existing {
                None => Err(E::from(GeoDbError::NotFound(key.clone()))),
                Some(bytes) => {
                    let mut record: SecureGeoRecord =
                        serde_json::from_slice(&bytes).map_err(GeoDbError::from)?;
                    match apply(&mut record) {
                        Ok(value) => {
                            ensure_payload(&record)?;
                            let json = serde_json::to_vec(&record).map_err(GeoDbError::from)?;
                            table
                                .insert(key.as_str(), json.as_slice())
                                .map_err(GeoDbError::from)?;
                            Ok(value)
                        }
                        Err(e) => Err(e),
                    }
                }
            }
        };

        match outcome {
            Ok(value) => {
                write_txn.commit().map_err(GeoDbError::from)?;
                Ok(value)
            }
            Err(e) => {
                write_txn.abort().map_err(GeoDbError::from)?;
                Err(e)
            }
        }
    }

    /// Remove a record, returning what was stored.
    pub fn remove(&self, project_id: &str, data_type: DataType) -> GeoDbResult<SecureGeoRecord> {
        let key = record_key(project_id, data_type);
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SECURE_GEO_RECORDS)?;
            let removed = table.remove(key.as_str())?;
            match removed {
                Some(value) => Some(serde_json::from_slice::<SecureGeoRecord>(value.value())?),
                None => None,
            }
        };

        match removed {
            Some(record) => {
                write_txn.commit()?;
                Ok(record)
            }
            None => {
                write_txn.abort()?;
                Err(GeoDbError::NotFound(key))
            }
        }
    }

    /// Read-only probe used by the readiness check.
    pub fn health_check(&self) -> GeoDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECURE_GEO_RECORDS)?;
        if let Some(entry) = table.iter()?.next() {
            entry?;
        }
        Ok(())
    }
}
