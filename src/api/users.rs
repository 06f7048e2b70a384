// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser, Role};
use crate::geo::{accessible_levels, SecurityLevel};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID (`sub` claim)
    pub user_id: String,
    /// User's role
    pub role: Role,
    /// Security levels this role may read
    pub accessible_levels: Vec<SecurityLevel>,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            accessible_levels: accessible_levels(user.role),
            user_id: user.user_id,
            role: user.role,
        }
    }
}

/// Get the current authenticated user's information.
///
/// Returns the caller's identity, role and the security levels that role
/// can read.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_me_response_from_authenticated_user() {
        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            role: Role::Surveyor,
            expires_at: 0,
        };

        let response: UserMeResponse = user.into();
        assert_eq!(response.user_id, "user_123");
        assert_eq!(response.role, Role::Surveyor);
        assert_eq!(
            response.accessible_levels,
            vec![SecurityLevel::Public, SecurityLevel::Internal]
        );
    }
}
