// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::cipher::CipherError;
use crate::storage::{GeoDbError, StorageError};

/// Failure kinds of the secure geo service.
///
/// The kind, not the message, decides the HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl GeoError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GeoError::NotFound(_) => "NOT_FOUND",
            GeoError::PermissionDenied(_) => "PERMISSION_DENIED",
            GeoError::Validation(_) => "VALIDATION_ERROR",
            GeoError::Conflict(_) => "CONFLICT",
            GeoError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn insufficient_permissions(action: &str) -> Self {
        GeoError::PermissionDenied(format!("Insufficient permissions to {action}"))
    }
}

impl From<StorageError> for GeoError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(msg) => GeoError::NotFound(msg),
            other => GeoError::Internal(format!("Storage error: {other}")),
        }
    }
}

impl From<GeoDbError> for GeoError {
    fn from(e: GeoDbError) -> Self {
        match e {
            GeoDbError::NotFound(key) => GeoError::NotFound(format!("Geo data not found: {key}")),
            GeoDbError::AlreadyExists(key) => {
                GeoError::Conflict(format!("Geo data already exists: {key}"))
            }
            GeoDbError::EmptyPayload(key) => {
                GeoError::Validation(format!("Refusing to persist record without payload: {key}"))
            }
            other => GeoError::Internal(format!("Database error: {other}")),
        }
    }
}

impl From<CipherError> for GeoError {
    fn from(e: CipherError) -> Self {
        GeoError::Internal(format!("Encryption error: {e}"))
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(e: serde_json::Error) -> Self {
        GeoError::Internal(format!("Serialization error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_keep_their_kind() {
        assert!(matches!(
            GeoError::from(GeoDbError::AlreadyExists("p|geojson".into())),
            GeoError::Conflict(_)
        ));
        assert!(matches!(
            GeoError::from(GeoDbError::NotFound("p|geojson".into())),
            GeoError::NotFound(_)
        ));
        assert!(matches!(
            GeoError::from(GeoDbError::EmptyPayload("p|geojson".into())),
            GeoError::Validation(_)
        ));
    }

    #[test]
    fn permission_message_is_stable() {
        let err = GeoError::insufficient_permissions("access this data");
        assert_eq!(err.to_string(), "Insufficient permissions to access this data");
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }
}
