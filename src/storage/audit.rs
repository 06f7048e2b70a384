// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only audit archive.
//!
//! Secure geo records carry their own capped audit trail, which disappears
//! with the record on deletion. Every entry is additionally mirrored here,
//! into daily JSONL files that are never rewritten, so the history of a
//! record (including its deletion) outlives the record itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::{FileStorage, StorageError, StorageResult};

/// Day granularity of the archive files.
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Secure geo record events
    GeoDataCreated,
    GeoDataAccessed,
    GeoDataModified,
    GeoDataExported,
    GeoDataDeleted,

    // Access control events
    PermissionDenied,

    // Admin events
    AdminAccess,
    MigrationRun,
}

impl AuditEventType {
    /// Parse the snake_case name used in query strings.
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}

/// An audit archive entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Resource affected (`<projectId>|<dataType>` for geo records).
    pub resource_id: Option<String>,
    /// Resource type (`secure_geo`).
    pub resource_type: Option<String>,
    /// IP address of the request (if available).
    pub ip_address: Option<String>,
    /// User agent of the request (if available).
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event stamped with the current time.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            ip_address: None,
            user_agent: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Keep the timestamp of the event being mirrored.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Set the caller's network details.
    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for archived audit events.
pub struct AuditRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Append an event to the archive file of its own day.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let day = event.timestamp.format(ARCHIVE_DATE_FORMAT).to_string();
        let line = serde_json::to_vec(event).map_err(|e| {
            StorageError::SerializationError(format!("Cannot encode audit event: {e}"))
        })?;
        self.storage
            .append_line(self.storage.paths().audit_events_file(&day), &line)
    }

    /// Events archived on `date` (`YYYY-MM-DD`), in write order. Lines that
    /// do not decode (a torn write, for instance) are logged and skipped.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let raw = self
            .storage
            .read_raw(self.storage.paths().audit_events_file(date))?;
        let text = String::from_utf8(raw).map_err(|e| {
            StorageError::SerializationError(format!("Audit archive for {date} is not UTF-8: {e}"))
        })?;

        let events: Vec<AuditEvent> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(
                        date,
                        line = index + 1,
                        error = %e,
                        "Skipping unreadable audit archive line"
                    );
                    None
                }
            })
            .collect();
        Ok(events)
    }

    /// Events of an inclusive day range. Days without an archive file are skipped.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value, ARCHIVE_DATE_FORMAT).map_err(|e| {
                StorageError::SerializationError(format!("Invalid archive date {value:?}: {e}"))
            })
        };
        let (first, last) = (parse(start_date)?, parse(end_date)?);

        let mut collected = Vec::new();
        for day in first.iter_days().take_while(|day| *day <= last) {
            match self.read_events(&day.format(ARCHIVE_DATE_FORMAT).to_string()) {
                Ok(events) => collected.extend(events),
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(collected)
    }
}
