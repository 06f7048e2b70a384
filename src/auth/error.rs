// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Why a request could not be attributed to a user with enough privilege.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthHeader,
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    #[error("Token is malformed")]
    MalformedToken,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// No secret configured and not a `dev` build.
    #[error("Authentication is not configured on this server")]
    NotConfigured,
    /// Authenticated, but the role does not allow the endpoint.
    #[error("Insufficient permissions for this operation")]
    InsufficientPermissions,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidIssuer => "INVALID_ISSUER",
            AuthError::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            AuthError::NotConfigured => "AUTH_NOT_CONFIGURED",
            AuthError::InsufficientPermissions => "PERMISSION_DENIED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Rejections share the error envelope of the rest of the API.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::new(self.status_code(), self.error_code(), self.to_string()).into_response()
    }
}
