// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::geo::GeoError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

/// Status code for each service error kind.
pub fn status_for(error: &GeoError) -> StatusCode {
    match error {
        GeoError::NotFound(_) => StatusCode::NOT_FOUND,
        GeoError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        GeoError::Validation(_) => StatusCode::BAD_REQUEST,
        GeoError::Conflict(_) => StatusCode::CONFLICT,
        GeoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GeoError> for ApiError {
    fn from(error: GeoError) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            tracing::error!(error = %error, "Secure geo operation failed");
        }
        Self::new(status, error.error_code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            message: self.message,
            error_code: self.error_code,
        });
        (self.status, body).into_response()
    }
}
