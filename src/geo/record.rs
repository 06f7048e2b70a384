// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted secure geo record and its embedded audit trail.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::access::{is_authorized, SecurityLevel};
use super::error::GeoError;
use crate::auth::Role;
use crate::storage::AuditEventType;

/// Maximum number of audit entries kept on a record.
pub const AUDIT_LOG_CAP: usize = 100;

/// Version of the encrypted payload format.
pub const PAYLOAD_FORMAT_VERSION: &str = "1.0";

/// Maximum length of a project id.
pub const MAX_PROJECT_ID_LEN: usize = 128;

/// Kind of geo data held by a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Geojson,
    SurveyData,
    BuildingData,
    ResidentData,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Geojson => "geojson",
            DataType::SurveyData => "survey_data",
            DataType::BuildingData => "building_data",
            DataType::ResidentData => "resident_data",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived facts about the plaintext payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoMetadata {
    pub total_features: usize,
    /// Size in bytes of the serialized plaintext.
    pub data_size: usize,
    pub last_modified: DateTime<Utc>,
    /// SHA-256 (hex) of the serialized plaintext.
    pub checksum: String,
    pub version: String,
}

/// Who may read a record beyond what the access matrix grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessControl {
    pub allowed_roles: BTreeSet<Role>,
    #[serde(default)]
    pub allowed_users: BTreeSet<String>,
    /// Payload keys stripped from non-admin reads.
    #[serde(default)]
    pub restricted_fields: BTreeSet<String>,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self {
            allowed_roles: BTreeSet::from([Role::Admin, Role::Manager]),
            allowed_users: BTreeSet::new(),
            restricted_fields: BTreeSet::new(),
        }
    }
}

impl AccessControl {
    /// Matrix check on the record's level, or an explicit per-user grant.
    ///
    /// `allowed_roles` is descriptive and never narrows the matrix.
    pub fn permits(&self, user_id: &str, role: Role, level: SecurityLevel) -> bool {
        is_authorized(role, level) || self.allowed_users.contains(user_id)
    }
}

/// Advisory retention dates. Nothing in this service enforces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub expires_at: Option<DateTime<Utc>>,
    pub archive_after: Option<DateTime<Utc>>,
    pub delete_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Accessed,
    Modified,
    Exported,
    Deleted,
}

impl AuditAction {
    /// Matching event type in the external archive.
    pub fn event_type(self) -> AuditEventType {
        match self {
            AuditAction::Created => AuditEventType::GeoDataCreated,
            AuditAction::Accessed => AuditEventType::GeoDataAccessed,
            AuditAction::Modified => AuditEventType::GeoDataModified,
            AuditAction::Exported => AuditEventType::GeoDataExported,
            AuditAction::Deleted => AuditEventType::GeoDataDeleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoAuditEntry {
    pub action: AuditAction,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

/// Capped, oldest-first audit sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AuditTrail(Vec<GeoAuditEntry>);

impl AuditTrail {
    /// Append an entry, evicting the oldest ones past [`AUDIT_LOG_CAP`].
    pub fn push(&mut self, entry: GeoAuditEntry) {
        self.0.push(entry);
        if self.0.len() > AUDIT_LOG_CAP {
            let excess = self.0.len() - AUDIT_LOG_CAP;
            self.0.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[GeoAuditEntry] {
        &self.0
    }
}

/// One encrypted geo dataset, unique per (project id, data type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureGeoRecord {
    pub project_id: String,
    pub data_type: DataType,
    pub security_level: SecurityLevel,
    /// `<nonce-hex>:<ciphertext-hex>`; never empty once persisted.
    pub encrypted_payload: String,
    pub metadata: GeoMetadata,
    pub access_control: AccessControl,
    pub audit_log: AuditTrail,
    pub retention_policy: Option<RetentionPolicy>,
    /// Starts at 1 and increases on every payload update.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecureGeoRecord {
    /// Database key of this record.
    pub fn key(&self) -> String {
        record_key(&self.project_id, self.data_type)
    }

    pub fn permits(&self, user_id: &str, role: Role) -> bool {
        self.access_control
            .permits(user_id, role, self.security_level)
    }
}

/// `<projectId>|<dataType>`; `|` cannot appear in a valid project id.
pub fn record_key(project_id: &str, data_type: DataType) -> String {
    format!("{project_id}|{}", data_type.as_str())
}

/// Words taken by fixed `/v1/secure-geo/...` routes.
pub const RESERVED_PROJECT_IDS: [&str; 2] = ["import", "migrate"];

/// Project ids are 1-128 characters of `[A-Za-z0-9_-]`, excluding the
/// reserved route words.
pub fn validate_project_id(project_id: &str) -> Result<(), GeoError> {
    if project_id.is_empty() || project_id.len() > MAX_PROJECT_ID_LEN {
        return Err(GeoError::Validation(format!(
            "Project id must be 1-{MAX_PROJECT_ID_LEN} characters"
        )));
    }
    if !project_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(GeoError::Validation(
            "Project id may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    if RESERVED_PROJECT_IDS
        .iter()
        .any(|word| project_id.eq_ignore_ascii_case(word))
    {
        return Err(GeoError::Validation(format!(
            "Project id '{project_id}' is reserved"
        )));
    }
    Ok(())
}
