// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users and request metadata.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        request::Parts,
    },
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::{claims::TokenClaims, AuthError, AuthenticatedUser};
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor for authenticated users.
///
/// Validates the bearer token from the Authorization header. A user already
/// placed in the request extensions (by a test harness or an outer layer)
/// is used as-is.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_jwt(token, &state.auth_config)?;
        Ok(Auth(user))
    }
}

/// Verify a bearer token and extract user information.
///
/// With a shared secret configured the token must carry a valid HS256
/// signature. Without one, only `dev` builds accept tokens (structure and
/// expiry checked, signature ignored).
pub fn verify_jwt(token: &str, auth_config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    match auth_config.secret.as_deref() {
        Some(secret) => verify_jwt_hs256(token, secret, auth_config.issuer.as_deref()),
        None => verify_jwt_development(token),
    }
}

fn verify_jwt_hs256(
    token: &str,
    secret: &str,
    issuer: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_aud = false;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        _ => AuthError::MalformedToken,
    })?;

    Ok(AuthenticatedUser::from_claims(token_data.claims))
}

/// Development JWT verification (no signature check).
///
/// WARNING: only compiled with the `dev` feature.
#[cfg(feature = "dev")]
fn verify_jwt_development(token: &str) -> Result<AuthenticatedUser, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;
    let claims = token_data.claims;

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    if claims.exp + CLOCK_SKEW_LEEWAY < now {
        return Err(AuthError::TokenExpired);
    }

    Ok(AuthenticatedUser::from_claims(claims))
}

#[cfg(not(feature = "dev"))]
fn verify_jwt_development(_token: &str) -> Result<AuthenticatedUser, AuthError> {
    Err(AuthError::NotConfigured)
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Extractor that requires an admin or manager (imports, direct stores).
pub struct ManagerOrAdmin(pub AuthenticatedUser);

impl FromRequestParts<AppState> for ManagerOrAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.role.is_data_steward() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(ManagerOrAdmin(user))
    }
}

/// Caller network details recorded in audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Derive client details from request parts.
    ///
    /// The address is the socket peer (available when the server was started
    /// with connect info). `x-forwarded-for` (first hop) and `x-real-ip` are
    /// client-controlled and only consulted when `trust_proxy_headers` is set,
    /// i.e. when a reverse proxy in front of the server overwrites them.
    pub fn from_parts(parts: &Parts, trust_proxy_headers: bool) -> Self {
        fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        }

        let forwarded = trust_proxy_headers
            .then(|| {
                header(parts, "x-forwarded-for")
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .or_else(|| header(parts, "x-real-ip"))
                    .map(str::to_string)
            })
            .flatten();

        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            ip_address,
            user_agent,
        }
    }
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_parts(parts, state.trust_proxy_headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::test_state;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn parts_with_header(name: &str, value: &str) -> Parts {
        Request::builder()
            .uri("/test")
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn signed_token(secret: &str, role: &str, exp: u64) -> String {
        let claims = TokenClaims {
            sub: "user_123".to_string(),
            exp,
            iat: None,
            iss: None,
            role: Some(role.to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_header() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_header("Authorization", "Basic dXNlcjpwYXNz");

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_signed_token() {
        let (state, _temp_dir) = test_state();
        let secret = state.auth_config.secret.clone().unwrap();
        let token = signed_token(&secret, "surveyor", far_future());
        let mut parts = parts_with_header("Authorization", &format!("Bearer {token}"));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Surveyor);
    }

    #[tokio::test]
    async fn auth_extractor_rejects_wrong_signature() {
        let (state, _temp_dir) = test_state();
        let token = signed_token("some-other-secret", "admin", far_future());
        let mut parts = parts_with_header("Authorization", &format!("Bearer {token}"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_expired_token() {
        let (state, _temp_dir) = test_state();
        let secret = state.auth_config.secret.clone().unwrap();
        let token = signed_token(&secret, "admin", 1_000_000);
        let mut parts = parts_with_header("Authorization", &format!("Bearer {token}"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(AuthenticatedUser {
            user_id: "user_from_extension".to_string(),
            role: Role::Admin,
            expires_at: 0,
        });

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_from_extension");
    }

    #[tokio::test]
    async fn admin_only_rejects_manager() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(AuthenticatedUser {
            user_id: "user_123".to_string(),
            role: Role::Manager,
            expires_at: 0,
        });

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn manager_or_admin_rejects_surveyor() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(AuthenticatedUser {
            user_id: "user_123".to_string(),
            role: Role::Surveyor,
            expires_at: 0,
        });

        let result = ManagerOrAdmin::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn missing_secret_rejects_tokens_outside_dev_builds() {
        let config = AuthConfig {
            secret: None,
            issuer: None,
        };
        let token = signed_token("whatever", "admin", far_future());
        assert!(matches!(
            verify_jwt(&token, &config),
            Err(AuthError::NotConfigured)
        ));
    }

    fn proxied_parts() -> Parts {
        let mut parts = Request::builder()
            .uri("/test")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .header("user-agent", "qgis/3.34")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        parts.extensions.insert(ConnectInfo(peer));
        parts
    }

    #[test]
    fn client_info_ignores_forwarding_headers_by_default() {
        let info = ClientInfo::from_parts(&proxied_parts(), false);
        assert_eq!(info.ip_address.as_deref(), Some("192.0.2.10"));
        assert_eq!(info.user_agent.as_deref(), Some("qgis/3.34"));

        let no_peer = parts_with_header("x-forwarded-for", "6.6.6.6");
        assert_eq!(ClientInfo::from_parts(&no_peer, false).ip_address, None);
    }

    #[test]
    fn client_info_uses_forwarding_headers_behind_trusted_proxy() {
        let info = ClientInfo::from_parts(&proxied_parts(), true);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));

        let real_ip_only = parts_with_header("x-real-ip", "198.51.100.4");
        assert_eq!(
            ClientInfo::from_parts(&real_ip_only, true).ip_address.as_deref(),
            Some("198.51.100.4")
        );
    }

    #[test]
    fn client_info_falls_back_to_connect_info() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        let addr: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        parts.extensions.insert(ConnectInfo(addr));

        let info = ClientInfo::from_parts(&parts, true);
        assert_eq!(info.ip_address.as_deref(), Some("192.0.2.10"));
        assert_eq!(info.user_agent, None);
    }
}
