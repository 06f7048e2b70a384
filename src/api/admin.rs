// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! The audit archive outlives deleted records, so this is where the full
//! history of a project can still be reviewed after a deletion.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AdminOnly, ClientInfo},
    error::ApiError,
    geo::validate_project_id,
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository, ARCHIVE_DATE_FORMAT},
};

/// Longest date range a single query may scan.
const MAX_RANGE_DAYS: i64 = 366;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for audit archive queries.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct AuditQueryParams {
    /// Start date (YYYY-MM-DD). Defaults to today.
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD). Defaults to today.
    pub end_date: Option<String>,
    /// Only events for records of this project.
    pub project_id: Option<String>,
    /// Filter by user ID.
    pub user_id: Option<String>,
    /// Filter by event type (e.g. `geo_data_deleted`).
    pub event_type: Option<String>,
    /// Maximum number of results (default 100, max 1000).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit archive queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, ARCHIVE_DATE_FORMAT)
        .map_err(|_| ApiError::bad_request(format!("Invalid {name} format. Use YYYY-MM-DD.")))
}

/// Validated filters of one archive query.
#[derive(Debug, Default)]
struct EventFilter {
    user_id: Option<String>,
    event_type: Option<AuditEventType>,
    /// `"<projectId>|"`, matching every data type of the project.
    resource_prefix: Option<String>,
}

impl EventFilter {
    fn from_params(params: &AuditQueryParams) -> Result<Self, ApiError> {
        let event_type = params
            .event_type
            .as_deref()
            .map(|name| {
                AuditEventType::parse(name)
                    .ok_or_else(|| ApiError::bad_request(format!("Unknown eventType: {name}")))
            })
            .transpose()?;

        let resource_prefix = match params.project_id.as_deref() {
            Some(project_id) => {
                validate_project_id(project_id)?;
                Some(format!("{project_id}|"))
            }
            None => None,
        };

        Ok(Self {
            user_id: params.user_id.clone(),
            event_type,
            resource_prefix,
        })
    }

    fn matches(&self, event: &AuditEvent) -> bool {
        let user_ok = self
            .user_id
            .as_deref()
            .is_none_or(|user_id| event.user_id.as_deref() == Some(user_id));
        let type_ok = self
            .event_type
            .is_none_or(|event_type| event.event_type == event_type);
        let resource_ok = self.resource_prefix.as_deref().is_none_or(|prefix| {
            event
                .resource_id
                .as_deref()
                .is_some_and(|id| id.starts_with(prefix))
        });
        user_ok && type_ok && resource_ok
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Query the audit archive.
///
/// Events are returned in the order they were written. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/audit/events",
    tag = "Admin",
    params(AuditQueryParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Archived events, oldest first", body = AuditLogResponse),
        (status = 400, description = "Bad date range, event type or project id"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn query_audit_logs(
    AdminOnly(admin): AdminOnly,
    client: ClientInfo,
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let today = Utc::now().format(ARCHIVE_DATE_FORMAT).to_string();
    let start_date = params.start_date.as_deref().unwrap_or(&today);
    let end_date = params.end_date.as_deref().unwrap_or(&today);

    let start = parse_date(start_date, "startDate")?;
    let end = parse_date(end_date, "endDate")?;
    if end < start {
        return Err(ApiError::bad_request("endDate must not be before startDate"));
    }
    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(ApiError::bad_request(format!(
            "Date range may span at most {MAX_RANGE_DAYS} days"
        )));
    }
    let filter = EventFilter::from_params(&params)?;

    let archive = AuditRepository::new(state.storage());
    let matching: Vec<AuditEvent> = archive
        .read_events_range(start_date, end_date)
        .map_err(|e| ApiError::internal(format!("Failed to read audit archive: {e}")))?
        .into_iter()
        .filter(|event| filter.matches(event))
        .collect();

    let total = matching.len();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let events = matching.into_iter().skip(offset).take(limit).collect();

    let access = AuditEvent::new(AuditEventType::AdminAccess)
        .with_user(&admin.user_id)
        .with_resource("audit_archive", format!("{start_date}..{end_date}"))
        .with_client(client.ip_address, client.user_agent);
    if let Err(e) = archive.log(&access) {
        warn!(error = %e, "Failed to record admin audit access");
    }

    Ok(Json(AuditLogResponse {
        events,
        total,
        has_more: offset.saturating_add(limit) < total,
    }))
}

// ============================================================================
// Tests
// ============================================================================
