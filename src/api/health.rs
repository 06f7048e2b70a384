// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unauthenticated probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Outcome of one readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Unavailable,
    /// Tokens are accepted without signature verification (`dev` builds).
    Development,
}

impl CheckStatus {
    fn of<E>(result: Result<(), E>) -> Self {
        if result.is_ok() {
            CheckStatus::Ok
        } else {
            CheckStatus::Unavailable
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// `ok` when storage and database both pass, otherwise `degraded`.
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: CheckStatus,
    /// Write/read round trip in the data directory.
    pub storage: CheckStatus,
    /// Secure geo record database.
    pub database: CheckStatus,
    pub auth: CheckStatus,
}

impl HealthChecks {
    fn run(state: &AppState) -> Self {
        Self {
            service: CheckStatus::Ok,
            storage: CheckStatus::of(state.storage().health_check()),
            database: CheckStatus::of(state.geo.health_check()),
            auth: if state.auth_config.is_configured() {
                CheckStatus::Ok
            } else {
                CheckStatus::Development
            },
        }
    }

    fn ready(&self) -> bool {
        self.storage == CheckStatus::Ok && self.database == CheckStatus::Ok
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Full health report. 503 when the data directory or database is unusable.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All checks pass", body = ReadyResponse),
        (status = 503, description = "Storage or database unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let checks = HealthChecks::run(&state);
    let (status, label) = if checks.ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(ReadyResponse {
            status: label.to_string(),
            checks,
        }),
    )
}

/// Liveness probe; never touches storage.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is up", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
