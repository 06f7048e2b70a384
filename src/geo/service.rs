// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure geo service: access checks, encryption, persistence and auditing.
//!
//! Every operation returns `Result<_, GeoError>`. Embedded audit entries are
//! mirrored into the append-only archive; a failed mirror is logged and the
//! operation proceeds, except for deletions, which are refused unless the
//! archive accepted the deletion entry.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::access::SecurityLevel;
use super::cipher::PayloadCipher;
use super::error::GeoError;
use super::import::{count_features, normalize_import, redact_fields};
use super::record::{
    record_key, validate_project_id, AccessControl, AuditAction, AuditTrail, DataType,
    GeoAuditEntry, GeoMetadata, RetentionPolicy, SecureGeoRecord, PAYLOAD_FORMAT_VERSION,
};
use crate::auth::Role;
use crate::storage::{
    AuditEvent, AuditEventType, AuditRepository, FileStorage, GeoDatabase, StorageResult,
};

pub type GeoResult<T> = Result<T, GeoError>;

/// Resource type used for archived geo events.
pub const RESOURCE_TYPE: &str = "secure_geo";

/// Extensions picked up by the legacy migration.
/// Resource id of migration events in the audit archive.
const LEGACY_RESOURCE_ID: &str = "legacy_geo";
const LEGACY_EXTENSIONS: [&str; 3] = ["geojson", "json", "ndjson"];

/// The caller of an operation, as recorded in audit entries.
#[derive(Debug, Clone)]
pub struct Requester {
    pub user_id: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Requester {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    fn entry(&self, action: AuditAction, details: Option<Value>) -> GeoAuditEntry {
        GeoAuditEntry {
            action,
            user_id: self.user_id.clone(),
            timestamp: Utc::now(),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            details,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    /// `None` means the default `{admin, manager}`.
    pub allowed_roles: Option<BTreeSet<Role>>,
    pub allowed_users: BTreeSet<String>,
    pub restricted_fields: BTreeSet<String>,
    pub retention_policy: Option<RetentionPolicy>,
    /// Recorded as the creator when known.
    pub requester: Option<Requester>,
}

#[derive(Debug, Clone)]
pub struct GetOptions {
    pub data_type: DataType,
    pub include_metadata: bool,
    pub log_access: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            data_type: DataType::default(),
            include_metadata: false,
            log_access: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    pub allowed_roles: Option<BTreeSet<Role>>,
    /// Delete the source file once the record is persisted.
    pub remove_original: bool,
    pub requester: Option<Requester>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub data_type: DataType,
    /// Fail with `Conflict` unless the stored revision matches.
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub data_type: DataType,
}

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub security_level: SecurityLevel,
    pub remove_originals: bool,
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Geojson,
    Json,
}

impl ExportFormat {
    pub fn parse(format: &str) -> GeoResult<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "geojson" => Ok(ExportFormat::Geojson),
            "json" => Ok(ExportFormat::Json),
            other => Err(GeoError::Validation(format!(
                "Unsupported export format: {other}"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Geojson => "geojson",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Geojson => "application/geo+json",
            ExportFormat::Json => "application/json",
        }
    }
}

/// Stored record as seen by callers: everything except ciphertext and audit entries.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub project_id: String,
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    pub metadata: GeoMetadata,
    pub revision: u64,
    pub audit_entries: usize,
}

impl From<&SecureGeoRecord> for RecordSummary {
    fn from(record: &SecureGeoRecord) -> Self {
        Self {
            project_id: record.project_id.clone(),
            data_type: record.data_type,
            security_level: record.security_level,
            metadata: record.metadata.clone(),
            revision: record.revision,
            audit_entries: record.audit_log.len(),
        }
    }
}

/// Decrypted payload returned by reads.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoDataView {
    pub project_id: String,
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    pub revision: u64,
    #[schema(value_type = Object)]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GeoMetadata>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoExport {
    pub filename: String,
    pub format: ExportFormat,
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub record: RecordSummary,
    pub source_removed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatus {
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    pub metadata: GeoMetadata,
    pub revision: u64,
    pub audit_entries: usize,
    pub allowed_roles: BTreeSet<Role>,
    pub retention_policy: Option<RetentionPolicy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoStatus {
    pub project_id: String,
    pub records: Vec<RecordStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationFailure {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Project ids imported by this run.
    pub migrated: Vec<String>,
    /// Project ids that already had a record.
    pub skipped: Vec<String>,
    pub failed: Vec<MigrationFailure>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn not_found(project_id: &str, data_type: DataType) -> GeoError {
    GeoError::NotFound(format!(
        "Geo data not found: {}",
        record_key(project_id, data_type)
    ))
}

pub struct SecureGeoService {
    db: GeoDatabase,
    cipher: PayloadCipher,
    files: FileStorage,
}

impl SecureGeoService {
    /// Open the record database under the storage root.
    pub fn open(files: FileStorage, cipher: PayloadCipher) -> GeoResult<Self> {
        let db = GeoDatabase::open(&files.paths().geo_database())?;
        Ok(Self { db, cipher, files })
    }

    pub fn files(&self) -> &FileStorage {
        &self.files
    }

    pub fn health_check(&self) -> GeoResult<()> {
        self.db.health_check()?;
        Ok(())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Encrypt and persist a new record.
    pub fn store_geo_data(
        &self,
        project_id: &str,
        payload: Value,
        options: StoreOptions,
    ) -> GeoResult<RecordSummary> {
        validate_project_id(project_id)?;
        let (encrypted_payload, metadata) = self.seal(&payload)?;

        let now = Utc::now();
        let mut record = SecureGeoRecord {
            project_id: project_id.to_string(),
            data_type: options.data_type,
            security_level: options.security_level,
            encrypted_payload,
            metadata,
            access_control: AccessControl {
                allowed_roles: options
                    .allowed_roles
                    .filter(|roles| !roles.is_empty())
                    .unwrap_or_else(|| AccessControl::default().allowed_roles),
                allowed_users: options.allowed_users,
                restricted_fields: options.restricted_fields,
            },
            audit_log: AuditTrail::default(),
            retention_policy: options.retention_policy,
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        let created = options.requester.as_ref().map(|requester| {
            requester.entry(
                AuditAction::Created,
                Some(json!({
                    "securityLevel": record.security_level,
                    "totalFeatures": record.metadata.total_features,
                })),
            )
        });
        if let Some(entry) = &created {
            record.audit_log.push(entry.clone());
        }

        self.db.insert_new(&record)?;

        if let Some(entry) = &created {
            self.archive(project_id, record.data_type, entry);
        }
        info!(
            project_id = %project_id,
            data_type = %record.data_type,
            security_level = %record.security_level,
            features = record.metadata.total_features,
            "Stored secure geo data"
        );
        Ok(RecordSummary::from(&record))
    }

    /// Decrypt a record for an authorized requester.
    pub fn get_geo_data(
        &self,
        project_id: &str,
        requester: &Requester,
        options: GetOptions,
    ) -> GeoResult<GeoDataView> {
        validate_project_id(project_id)?;
        let data_type = options.data_type;

        let result = if options.log_access {
            self.db
                .update(project_id, data_type, |record| {
                    let data = self.reveal(record, requester)?;
                    let entry = requester.entry(AuditAction::Accessed, None);
                    record.audit_log.push(entry.clone());
                    Ok((view(record, data, options.include_metadata), entry))
                })
                .map(|(view, entry)| {
                    self.archive(project_id, data_type, &entry);
                    view
                })
        } else {
            self.db
                .get(project_id, data_type)?
                .ok_or_else(|| not_found(project_id, data_type))
                .and_then(|record| {
                    let data = self.reveal(&record, requester)?;
                    Ok(view(&record, data, options.include_metadata))
                })
        };

        if let Err(GeoError::PermissionDenied(reason)) = &result {
            self.record_denial(&record_key(project_id, data_type), requester, "read", reason);
        }
        result
    }

    /// Import a GeoJSON, JSON or NDJSON file as a new record.
    pub fn import_from_file(
        &self,
        path: &Path,
        project_id: &str,
        options: ImportOptions,
    ) -> GeoResult<ImportSummary> {
        validate_project_id(project_id)?;

        let bytes = self.files.read_raw(path)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            GeoError::Validation(format!("Import file is not UTF-8: {}", path.display()))
        })?;
        let payload = normalize_import(&content)?;

        let record = self.store_geo_data(
            project_id,
            payload,
            StoreOptions {
                data_type: options.data_type,
                security_level: options.security_level,
                allowed_roles: options.allowed_roles,
                requester: options.requester,
                ..StoreOptions::default()
            },
        )?;

        // The record is committed at this point; only now may the source go.
        let source_removed = if options.remove_original {
            match std::fs::remove_file(path) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove imported file");
                    false
                }
            }
        } else {
            false
        };

        info!(
            project_id = %project_id,
            path = %path.display(),
            features = record.metadata.total_features,
            source_removed,
            "Imported geo data file"
        );
        Ok(ImportSummary {
            record,
            source_removed,
        })
    }

    /// Read without access logging, then record a single export entry.
    pub fn export_geo_data(
        &self,
        project_id: &str,
        requester: &Requester,
        format: &str,
        data_type: DataType,
    ) -> GeoResult<GeoExport> {
        let format = ExportFormat::parse(format)?;
        let view = self.get_geo_data(
            project_id,
            requester,
            GetOptions {
                data_type,
                include_metadata: false,
                log_access: false,
            },
        )?;

        let entry = requester.entry(
            AuditAction::Exported,
            Some(json!({ "format": format.extension() })),
        );
        self.db.update(project_id, data_type, |record| {
            record.audit_log.push(entry.clone());
            Ok::<_, GeoError>(())
        })?;
        self.archive(project_id, data_type, &entry);

        Ok(GeoExport {
            filename: format!("project_{project_id}_geodata.{}", format.extension()),
            format,
            data: view.data,
        })
    }

    /// Replace the payload of an existing record.
    pub fn update_geo_data(
        &self,
        project_id: &str,
        new_data: Value,
        requester: &Requester,
        options: UpdateOptions,
    ) -> GeoResult<RecordSummary> {
        validate_project_id(project_id)?;
        let data_type = options.data_type;
        let (encrypted_payload, metadata) = self.seal(&new_data)?;

        let result = self.db.update(project_id, data_type, |record| {
            if !record.permits(&requester.user_id, requester.role) {
                return Err(GeoError::insufficient_permissions("modify this data"));
            }
            if let Some(expected) = options.expected_revision {
                if expected != record.revision {
                    return Err(GeoError::Conflict(format!(
                        "Revision mismatch: expected {expected}, current {}",
                        record.revision
                    )));
                }
            }

            record.encrypted_payload = encrypted_payload;
            record.metadata = metadata;
            record.revision += 1;
            record.updated_at = Utc::now();

            let entry = requester.entry(
                AuditAction::Modified,
                Some(json!({
                    "revision": record.revision,
                    "totalFeatures": record.metadata.total_features,
                })),
            );
            record.audit_log.push(entry.clone());
            Ok((RecordSummary::from(&*record), entry))
        });

        match result {
            Ok((summary, entry)) => {
                self.archive(project_id, data_type, &entry);
                info!(
                    project_id = %project_id,
                    data_type = %data_type,
                    revision = summary.revision,
                    "Updated secure geo data"
                );
                Ok(summary)
            }
            Err(GeoError::PermissionDenied(reason)) => {
                self.record_denial(
                    &record_key(project_id, data_type),
                    requester,
                    "update",
                    &reason,
                );
                Err(GeoError::PermissionDenied(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a record. Admin only.
    pub fn delete_geo_data(
        &self,
        project_id: &str,
        requester: &Requester,
        options: DeleteOptions,
    ) -> GeoResult<RecordSummary> {
        validate_project_id(project_id)?;
        let data_type = options.data_type;

        if requester.role != Role::Admin {
            let err = GeoError::insufficient_permissions("delete geo data (admin role required)");
            self.record_denial(
                &record_key(project_id, data_type),
                requester,
                "delete",
                &err.to_string(),
            );
            return Err(err);
        }

        let existing = self
            .db
            .get(project_id, data_type)?
            .ok_or_else(|| not_found(project_id, data_type))?;

        let entry = requester.entry(
            AuditAction::Deleted,
            Some(json!({
                "revision": existing.revision,
                "securityLevel": existing.security_level,
            })),
        );

        // The embedded trail disappears with the record, so the archive copy
        // has to exist before anything is removed.
        self.mirror(project_id, data_type, &entry).map_err(|e| {
            error!(project_id = %project_id, error = %e, "Cannot archive deletion entry");
            GeoError::Internal(format!("Failed to archive deletion entry: {e}"))
        })?;

        self.db.update(project_id, data_type, |record| {
            record.audit_log.push(entry.clone());
            Ok::<_, GeoError>(())
        })?;
        let removed = self.db.remove(project_id, data_type)?;

        info!(
            project_id = %project_id,
            data_type = %data_type,
            user_id = %requester.user_id,
            "Deleted secure geo data"
        );
        Ok(RecordSummary::from(&removed))
    }

    /// Embedded audit trail of a record. Admins and managers only.
    pub fn get_audit_log(
        &self,
        project_id: &str,
        requester: &Requester,
        data_type: DataType,
    ) -> GeoResult<Vec<GeoAuditEntry>> {
        validate_project_id(project_id)?;

        if !requester.role.is_data_steward() {
            let err = GeoError::insufficient_permissions("view audit logs");
            self.record_denial(
                &record_key(project_id, data_type),
                requester,
                "audit",
                &err.to_string(),
            );
            return Err(err);
        }

        let record = self
            .db
            .get(project_id, data_type)?
            .ok_or_else(|| not_found(project_id, data_type))?;
        Ok(record.audit_log.entries().to_vec())
    }

    /// Status of every record of the project the requester may read.
    ///
    /// Nothing is decrypted.
    pub fn get_status(&self, project_id: &str, requester: &Requester) -> GeoResult<GeoStatus> {
        validate_project_id(project_id)?;

        let records = self.db.list_by_project(project_id)?;
        if records.is_empty() {
            return Err(GeoError::NotFound(format!(
                "No geo data for project: {project_id}"
            )));
        }

        let visible: Vec<RecordStatus> = records
            .iter()
            .filter(|record| record.permits(&requester.user_id, requester.role))
            .map(|record| RecordStatus {
                data_type: record.data_type,
                security_level: record.security_level,
                metadata: record.metadata.clone(),
                revision: record.revision,
                audit_entries: record.audit_log.len(),
                allowed_roles: record.access_control.allowed_roles.clone(),
                retention_policy: record.retention_policy.clone(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            })
            .collect();

        if visible.is_empty() {
            return Err(GeoError::insufficient_permissions(
                "view this project's geo data",
            ));
        }

        Ok(GeoStatus {
            project_id: project_id.to_string(),
            records: visible,
        })
    }

    /// Import plaintext files left in the legacy directory. Admin only.
    ///
    /// Each file is named after its project id. Projects that already have a
    /// record are skipped; bad names or contents are reported, not fatal.
    pub fn migrate_legacy_files(
        &self,
        requester: &Requester,
        options: MigrateOptions,
    ) -> GeoResult<MigrationReport> {
        if requester.role != Role::Admin {
            let err = GeoError::insufficient_permissions("run migrations (admin role required)");
            self.record_denial(LEGACY_RESOURCE_ID, requester, "migrate", &err.to_string());
            return Err(err);
        }

        let legacy_dir = self.files.paths().legacy_geo_dir();
        let files = self.files.list_files(&legacy_dir, &LEGACY_EXTENSIONS)?;

        let mut report = MigrationReport::default();
        for path in files {
            let file_name = display_name(&path);
            let Some(project_id) = path.file_stem().and_then(|s| s.to_str()) else {
                report.failed.push(MigrationFailure {
                    file: file_name,
                    reason: "File name is not valid UTF-8".to_string(),
                });
                continue;
            };
            if let Err(e) = validate_project_id(project_id) {
                report.failed.push(MigrationFailure {
                    file: file_name,
                    reason: e.to_string(),
                });
                continue;
            }
            if self.db.get(project_id, DataType::Geojson)?.is_some() {
                report.skipped.push(project_id.to_string());
                continue;
            }

            let outcome = self.import_from_file(
                &path,
                project_id,
                ImportOptions {
                    data_type: DataType::Geojson,
                    security_level: options.security_level,
                    allowed_roles: None,
                    remove_original: options.remove_originals,
                    requester: Some(requester.clone()),
                },
            );
            match outcome {
                Ok(_) => report.migrated.push(project_id.to_string()),
                Err(GeoError::Conflict(_)) => report.skipped.push(project_id.to_string()),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Legacy geo file migration failed");
                    report.failed.push(MigrationFailure {
                        file: file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let event = AuditEvent::new(AuditEventType::MigrationRun)
            .with_user(&requester.user_id)
            .with_client(requester.ip_address.clone(), requester.user_agent.clone())
            .with_details(json!({
                "migrated": report.migrated.len(),
                "skipped": report.skipped.len(),
                "failed": report.failed.len(),
            }));
        if let Err(e) = AuditRepository::new(&self.files).log(&event) {
            warn!(error = %e, "Failed to archive migration run");
        }

        info!(
            migrated = report.migrated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Legacy geo migration finished"
        );
        Ok(report)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Serialize, checksum and encrypt a payload.
    fn seal(&self, payload: &Value) -> GeoResult<(String, GeoMetadata)> {
        let plaintext = serde_json::to_vec(payload)?;
        let encrypted = self.cipher.encrypt_bytes(&plaintext)?;
        if encrypted.is_empty() {
            return Err(GeoError::Validation(
                "Encryption produced no output".to_string(),
            ));
        }

        let metadata = GeoMetadata {
            total_features: count_features(payload),
            data_size: plaintext.len(),
            last_modified: Utc::now(),
            checksum: sha256_hex(&plaintext),
            version: PAYLOAD_FORMAT_VERSION.to_string(),
        };
        Ok((encrypted, metadata))
    }

    /// Authorize, decrypt, verify and redact a record's payload.
    fn reveal(&self, record: &SecureGeoRecord, requester: &Requester) -> GeoResult<Value> {
        if !record.permits(&requester.user_id, requester.role) {
            return Err(GeoError::insufficient_permissions("access this data"));
        }

        let unavailable = || GeoError::PermissionDenied("Unable to decrypt data".to_string());
        let plaintext = self
            .cipher
            .decrypt_bytes(&record.encrypted_payload)
            .ok_or_else(unavailable)?;

        if sha256_hex(&plaintext) != record.metadata.checksum {
            error!(
                project_id = %record.project_id,
                data_type = %record.data_type,
                "Checksum mismatch on decrypted payload"
            );
            return Err(GeoError::Internal(
                "Integrity check failed for stored geo data".to_string(),
            ));
        }

        let mut data: Value = serde_json::from_slice(&plaintext).map_err(|_| unavailable())?;
        if requester.role != Role::Admin {
            redact_fields(&mut data, &record.access_control.restricted_fields);
        }
        Ok(data)
    }

    /// Append an embedded entry to the archive.
    fn mirror(
        &self,
        project_id: &str,
        data_type: DataType,
        entry: &GeoAuditEntry,
    ) -> StorageResult<()> {
        let mut event = AuditEvent::new(entry.action.event_type())
            .at(entry.timestamp)
            .with_user(&entry.user_id)
            .with_resource(RESOURCE_TYPE, record_key(project_id, data_type))
            .with_client(entry.ip_address.clone(), entry.user_agent.clone());
        if let Some(details) = &entry.details {
            event = event.with_details(details.clone());
        }
        AuditRepository::new(&self.files).log(&event)
    }

    fn archive(&self, project_id: &str, data_type: DataType, entry: &GeoAuditEntry) {
        if let Err(e) = self.mirror(project_id, data_type, entry) {
            warn!(
                project_id = %project_id,
                action = ?entry.action,
                error = %e,
                "Failed to archive audit entry"
            );
        }
    }

    fn record_denial(
        &self,
        resource_id: &str,
        requester: &Requester,
        operation: &str,
        reason: &str,
    ) {
        warn!(
            resource_id,
            user_id = %requester.user_id,
            role = %requester.role,
            operation,
            "Secure geo access denied"
        );
        let event = AuditEvent::new(AuditEventType::PermissionDenied)
            .with_user(&requester.user_id)
            .with_resource(RESOURCE_TYPE, resource_id)
            .with_client(requester.ip_address.clone(), requester.user_agent.clone())
            .with_details(json!({ "operation": operation, "role": requester.role }))
            .failed(reason);
        if let Err(e) = AuditRepository::new(&self.files).log(&event) {
            warn!(error = %e, "Failed to archive permission denial");
        }
    }
}

fn view(record: &SecureGeoRecord, data: Value, include_metadata: bool) -> GeoDataView {
    GeoDataView {
        project_id: record.project_id.clone(),
        data_type: record.data_type,
        security_level: record.security_level,
        revision: record.revision,
        data,
        metadata: include_metadata.then(|| record.metadata.clone()),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
