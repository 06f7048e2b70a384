// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure geo data endpoints.
//!
//! Handlers translate requests into [`SecureGeoService`] calls. Role checks
//! that belong to the data (access matrix, admin-only delete, audit review)
//! live in the service; the extractors here only gate imports, direct stores
//! and migrations.
//!
//! [`SecureGeoService`]: crate::geo::SecureGeoService

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AdminOnly, Auth, AuthenticatedUser, ClientInfo, ManagerOrAdmin, Role},
    error::ApiError,
    geo::{
        resolve_import_path, DataType, DeleteOptions, GeoAuditEntry, GeoDataView, GeoStatus,
        GetOptions, ImportOptions, ImportSummary, MigrateOptions, MigrationReport,
        RecordSummary, Requester, RetentionPolicy, SecurityLevel, StoreOptions, UpdateOptions,
    },
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Success envelope shared by every secure geo endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data,
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// File to import, relative to the server's imports directory.
    pub file_path: String,
    /// Delete the file once the record is stored.
    #[serde(default)]
    pub remove_original: bool,
    pub security_level: Option<SecurityLevel>,
    pub data_type: Option<DataType>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    #[schema(value_type = Object)]
    pub geo_data: Value,
    pub data_type: Option<DataType>,
    pub security_level: Option<SecurityLevel>,
    pub allowed_roles: Option<BTreeSet<Role>>,
    #[serde(default)]
    pub allowed_users: BTreeSet<String>,
    #[serde(default)]
    pub restricted_fields: BTreeSet<String>,
    pub retention_policy: Option<RetentionPolicy>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[schema(value_type = Object)]
    pub geo_data: Value,
    pub data_type: Option<DataType>,
    /// Reject the update unless the stored revision still matches.
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRequest {
    #[serde(default)]
    pub remove_originals: bool,
    pub security_level: Option<SecurityLevel>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct GetQuery {
    /// Include checksum, size and feature count.
    pub include_metadata: Option<bool>,
    pub data_type: Option<DataType>,
    /// Append an `accessed` audit entry (default true).
    pub log_access: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct ExportQuery {
    /// `geojson` (default) or `json`.
    pub format: Option<String>,
    pub data_type: Option<DataType>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct DataTypeQuery {
    pub data_type: Option<DataType>,
}

fn requester(user: AuthenticatedUser, client: ClientInfo) -> Requester {
    Requester::new(user.user_id, user.role).with_client(client.ip_address, client.user_agent)
}

// ============================================================================
// Handlers
// ============================================================================

/// Import a GeoJSON/JSON/NDJSON file from the imports directory.
#[utoipa::path(
    post,
    path = "/v1/secure-geo/import/{projectId}",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier")),
    request_body = ImportRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Imported", body = ImportSummary),
        (status = 400, description = "Invalid file or path"),
        (status = 403, description = "Admin or manager required"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Record already exists")
    )
)]
pub async fn import_geo_data(
    ManagerOrAdmin(user): ManagerOrAdmin,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let imports_dir = state.storage().paths().imports_dir();
    let path = resolve_import_path(&imports_dir, &request.file_path)?;

    let summary = state.geo.import_from_file(
        &path,
        &project_id,
        ImportOptions {
            data_type: request.data_type.unwrap_or_default(),
            security_level: request.security_level.unwrap_or_default(),
            allowed_roles: None,
            remove_original: request.remove_original,
            requester: Some(requester(user, client)),
        },
    )?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Geo data imported", summary),
    ))
}

/// Store a payload sent in the request body.
#[utoipa::path(
    post,
    path = "/v1/secure-geo/{projectId}",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier")),
    request_body = StoreRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Stored", body = RecordSummary),
        (status = 400, description = "Invalid project id or payload"),
        (status = 403, description = "Admin or manager required"),
        (status = 409, description = "Record already exists")
    )
)]
pub async fn store_geo_data(
    ManagerOrAdmin(user): ManagerOrAdmin,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<StoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.geo.store_geo_data(
        &project_id,
        request.geo_data,
        StoreOptions {
            data_type: request.data_type.unwrap_or_default(),
            security_level: request.security_level.unwrap_or_default(),
            allowed_roles: request.allowed_roles,
            allowed_users: request.allowed_users,
            restricted_fields: request.restricted_fields,
            retention_policy: request.retention_policy,
            requester: Some(requester(user, client)),
        },
    )?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Geo data stored", summary),
    ))
}

/// Decrypt and return a project's geo data.
#[utoipa::path(
    get,
    path = "/v1/secure-geo/{projectId}",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier"), GetQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Decrypted data", body = GeoDataView),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "No such record")
    )
)]
pub async fn get_geo_data(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<GetQuery>,
) -> Result<Json<ApiResponse<GeoDataView>>, ApiError> {
    let view = state.geo.get_geo_data(
        &project_id,
        &requester(user, client),
        GetOptions {
            data_type: query.data_type.unwrap_or_default(),
            include_metadata: query.include_metadata.unwrap_or(false),
            log_access: query.log_access.unwrap_or(true),
        },
    )?;
    Ok(ApiResponse::ok(view))
}

/// Replace a project's geo data.
#[utoipa::path(
    put,
    path = "/v1/secure-geo/{projectId}",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier")),
    request_body = UpdateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated", body = RecordSummary),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "No such record"),
        (status = 409, description = "Revision mismatch")
    )
)]
pub async fn update_geo_data(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<ApiResponse<RecordSummary>>, ApiError> {
    let summary = state.geo.update_geo_data(
        &project_id,
        request.geo_data,
        &requester(user, client),
        UpdateOptions {
            data_type: request.data_type.unwrap_or_default(),
            expected_revision: request.expected_revision,
        },
    )?;
    Ok(ApiResponse::with_message("Geo data updated", summary))
}

/// Download a project's geo data as a file.
#[utoipa::path(
    get,
    path = "/v1/secure-geo/{projectId}/export",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier"), ExportQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Exported file (Content-Disposition: attachment)"),
        (status = 400, description = "Unsupported format"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "No such record")
    )
)]
pub async fn export_geo_data(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let export = state.geo.export_geo_data(
        &project_id,
        &requester(user, client),
        query.format.as_deref().unwrap_or("geojson"),
        query.data_type.unwrap_or_default(),
    )?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, export.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Json(export.data),
    ))
}

/// Delete a project's geo data. Admin only.
#[utoipa::path(
    delete,
    path = "/v1/secure-geo/{projectId}",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier"), DataTypeQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted", body = RecordSummary),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No such record")
    )
)]
pub async fn delete_geo_data(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<DataTypeQuery>,
) -> Result<Json<ApiResponse<RecordSummary>>, ApiError> {
    let removed = state.geo.delete_geo_data(
        &project_id,
        &requester(user, client),
        DeleteOptions {
            data_type: query.data_type.unwrap_or_default(),
        },
    )?;
    Ok(ApiResponse::with_message("Geo data deleted", removed))
}

/// Embedded audit trail of a record. Admins and managers only.
#[utoipa::path(
    get,
    path = "/v1/secure-geo/{projectId}/audit",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier"), DataTypeQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit entries, oldest first", body = [GeoAuditEntry]),
        (status = 403, description = "Admin or manager required"),
        (status = 404, description = "No such record")
    )
)]
pub async fn get_audit_log(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<DataTypeQuery>,
) -> Result<Json<ApiResponse<Vec<GeoAuditEntry>>>, ApiError> {
    let entries = state.geo.get_audit_log(
        &project_id,
        &requester(user, client),
        query.data_type.unwrap_or_default(),
    )?;
    Ok(ApiResponse::ok(entries))
}

/// Status of the project's records visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/secure-geo/{projectId}/status",
    tag = "Secure Geo",
    params(("projectId" = String, Path, description = "Project identifier")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Record status", body = GeoStatus),
        (status = 403, description = "No readable records"),
        (status = 404, description = "Project has no geo data")
    )
)]
pub async fn get_status(
    Auth(user): Auth,
    client: ClientInfo,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<GeoStatus>>, ApiError> {
    let status = state
        .geo
        .get_status(&project_id, &requester(user, client))?;
    Ok(ApiResponse::ok(status))
}

/// Encrypt plaintext files left in the legacy directory. Admin only.
#[utoipa::path(
    post,
    path = "/v1/secure-geo/migrate",
    tag = "Secure Geo",
    request_body = MigrateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Migration report", body = MigrationReport),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn migrate_legacy(
    AdminOnly(user): AdminOnly,
    client: ClientInfo,
    State(state): State<AppState>,
    Json(request): Json<MigrateRequest>,
) -> Result<Json<ApiResponse<MigrationReport>>, ApiError> {
    let report = state.geo.migrate_legacy_files(
        &requester(user, client),
        MigrateOptions {
            security_level: request.security_level.unwrap_or_default(),
            remove_originals: request.remove_originals,
        },
    )?;
    Ok(ApiResponse::with_message("Migration finished", report))
}
