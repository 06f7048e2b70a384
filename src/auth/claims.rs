// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried by bearer tokens issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration timestamp
    pub exp: u64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Role name as assigned by the user approval flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Authenticated user information extracted from JWT.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// User's role
    pub role: Role,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: u64,
}

impl AuthenticatedUser {
    /// Create from verified token claims.
    ///
    /// A missing or unrecognised role claim falls back to [`Role::Viewer`].
    pub fn from_claims(claims: TokenClaims) -> Self {
        let role = claims
            .role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or_default();

        Self {
            user_id: claims.sub,
            role,
            expires_at: claims.exp,
        }
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "user_123".to_string(),
            exp: 1700003600,
            iat: Some(1700000000),
            iss: Some("geo-auth".to_string()),
            role: Some("manager".to_string()),
        }
    }

    #[test]
    fn from_claims_extracts_user_id_and_role() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Manager);
        assert!(!user.is_admin());
    }

    #[test]
    fn from_claims_defaults_to_viewer_role() {
        let mut claims = sample_claims();
        claims.role = None;
        assert_eq!(AuthenticatedUser::from_claims(claims).role, Role::Viewer);

        let mut claims = sample_claims();
        claims.role = Some("superuser".to_string());
        assert_eq!(AuthenticatedUser::from_claims(claims).role, Role::Viewer);
    }
}
