// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{Level, Span};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    geo::{
        AccessControl, AuditAction, DataType, ExportFormat, GeoAuditEntry, GeoDataView,
        GeoMetadata, GeoStatus, ImportSummary, MigrationFailure, MigrationReport, RecordStatus,
        RecordSummary, RetentionPolicy, SecurityLevel,
    },
    state::AppState,
    storage::{AuditEvent, AuditEventType},
};

pub mod admin;
pub mod health;
pub mod secure_geo;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/secure-geo/import/{projectId}",
            post(secure_geo::import_geo_data),
        )
        .route("/secure-geo/migrate", post(secure_geo::migrate_legacy))
        .route(
            "/secure-geo/{projectId}",
            get(secure_geo::get_geo_data)
                .post(secure_geo::store_geo_data)
                .put(secure_geo::update_geo_data)
                .delete(secure_geo::delete_geo_data),
        )
        .route(
            "/secure-geo/{projectId}/export",
            get(secure_geo::export_geo_data),
        )
        .route("/secure-geo/{projectId}/audit", get(secure_geo::get_audit_log))
        .route("/secure-geo/{projectId}/status", get(secure_geo::get_status))
        .route("/admin/audit/events", get(admin::query_audit_logs))
        .route("/users/me", get(users::get_current_user));

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(CorsLayer::permissive())
}

/// Span for one HTTP request, tagged with its request id.
fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        secure_geo::import_geo_data,
        secure_geo::store_geo_data,
        secure_geo::get_geo_data,
        secure_geo::update_geo_data,
        secure_geo::export_geo_data,
        secure_geo::delete_geo_data,
        secure_geo::get_audit_log,
        secure_geo::get_status,
        secure_geo::migrate_legacy,
        admin::query_audit_logs,
        users::get_current_user
    ),
    components(
        schemas(
            Role,
            SecurityLevel,
            DataType,
            AccessControl,
            RetentionPolicy,
            GeoMetadata,
            AuditAction,
            GeoAuditEntry,
            RecordSummary,
            GeoDataView,
            ImportSummary,
            RecordStatus,
            GeoStatus,
            MigrationFailure,
            MigrationReport,
            ExportFormat,
            AuditEvent,
            AuditEventType,
            secure_geo::ImportRequest,
            secure_geo::StoreRequest,
            secure_geo::UpdateRequest,
            secure_geo::MigrateRequest,
            admin::AuditLogResponse,
            users::UserMeResponse,
            health::ReadyResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Secure Geo", description = "Encrypted geo data with role-based access"),
        (name = "Admin", description = "Audit archive review"),
        (name = "Users", description = "Caller identity"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenClaims;
    use crate::state::test_support::{test_state, TEST_SECRET};
    use axum::body::to_bytes;
    use axum::extract::ConnectInfo;
    use axum::http::{header, HeaderValue, StatusCode};
    use std::net::SocketAddr;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn token(user_id: &str, role: &str) -> String {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            exp: chrono::Utc::now().timestamp() as u64 + 3600,
            iat: None,
            iss: None,
            role: Some(role.to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(method: &str, uri: &str, role: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token(&format!("user_{role}"), role)),
            );
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn sample_payload() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {"name": "school"}}]
        })
    }

    #[tokio::test]
    async fn health_is_public_and_tagged_with_request_id() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request("GET", "/health/live", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let (state, _temp) = test_state();
        let app = router(state);

        let (status, body) = send(&app, request("GET", "/v1/users/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn store_then_read_by_role() {
        let (state, _temp) = test_state();
        let app = router(state);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("manager"),
                Some(json!({ "geoData": sample_payload() })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["securityLevel"], "confidential");

        let (status, body) = send(&app, request("GET", "/v1/secure-geo/proj-1", Some("viewer"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "PERMISSION_DENIED");

        let (status, body) = send(
            &app,
            request("GET", "/v1/secure-geo/proj-1?includeMetadata=true", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["data"]["features"][0]["properties"]["name"], "school");
        assert_eq!(body["data"]["metadata"]["totalFeatures"], 1);

        let (status, _) = send(&app, request("GET", "/v1/secure-geo/proj-2", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn surveyor_cannot_store() {
        let (state, _temp) = test_state();
        let app = router(state);

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("surveyor"),
                Some(json!({ "geoData": sample_payload() })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let (state, _temp) = test_state();
        let app = router(state);
        send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("admin"),
                Some(json!({ "geoData": sample_payload(), "securityLevel": "internal" })),
            ),
        )
        .await;

        let update = json!({ "geoData": sample_payload(), "expectedRevision": 1 });
        let (status, body) = send(
            &app,
            request("PUT", "/v1/secure-geo/proj-1", Some("surveyor"), Some(update.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["revision"], 2);

        let (status, body) = send(
            &app,
            request("PUT", "/v1/secure-geo/proj-1", Some("surveyor"), Some(update)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_code"], "CONFLICT");
    }

    #[tokio::test]
    async fn export_sets_attachment_headers() {
        let (state, _temp) = test_state();
        let app = router(state);
        send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("admin"),
                Some(json!({ "geoData": sample_payload() })),
            ),
        )
        .await;

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/v1/secure-geo/proj-1/export?format=geojson",
                Some("admin"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"project_proj-1_geodata.geojson\""
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/geo+json"
        );

        let (status, _) = send(
            &app,
            request("GET", "/v1/secure-geo/proj-1/export?format=kml", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_admin_only_and_archived() {
        let (state, _temp) = test_state();
        let app = router(state);
        send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("admin"),
                Some(json!({ "geoData": sample_payload() })),
            ),
        )
        .await;

        let (status, _) = send(&app, request("DELETE", "/v1/secure-geo/proj-1", Some("manager"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, request("DELETE", "/v1/secure-geo/proj-1", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, request("GET", "/v1/secure-geo/proj-1", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            request(
                "GET",
                "/v1/admin/audit/events?projectId=proj-1&eventType=geo_data_deleted",
                Some("admin"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["events"][0]["user_id"], "user_admin");
    }

    #[tokio::test]
    async fn import_path_must_stay_in_imports_dir() {
        let (state, temp) = test_state();
        let app = router(state);
        std::fs::write(temp.path().join("secret.json"), "{}").unwrap();
        std::fs::write(
            temp.path().join("imports").join("site.ndjson"),
            "{\"type\":\"Feature\"}\n{\"type\":\"Feature\"}\n",
        )
        .unwrap();

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/import/proj-1",
                Some("manager"),
                Some(json!({ "filePath": "../secret.json" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/import/proj-1",
                Some("manager"),
                Some(json!({ "filePath": "site.ndjson", "securityLevel": "internal" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["record"]["metadata"]["totalFeatures"], 2);
    }

    #[tokio::test]
    async fn migrate_requires_admin() {
        let (state, _temp) = test_state();
        let app = router(state);

        let (status, _) = send(
            &app,
            request("POST", "/v1/secure-geo/migrate", Some("manager"), Some(json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            request("POST", "/v1/secure-geo/migrate", Some("admin"), Some(json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["migrated"], json!([]));
    }

    #[tokio::test]
    async fn reserved_route_words_are_not_project_ids() {
        let (state, _temp) = test_state();
        let app = router(state);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/v1/secure-geo/Migrate",
                Some("admin"),
                Some(json!({ "geoData": sample_payload() })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn audit_ip_comes_from_peer_unless_proxy_is_trusted() {
        for (trust, expected) in [(false, "192.0.2.10"), (true, "203.0.113.9")] {
            let (state, _temp) = test_state();
            let app = router(state.with_trusted_proxy_headers(trust));

            let mut req = request(
                "POST",
                "/v1/secure-geo/proj-1",
                Some("admin"),
                Some(json!({ "geoData": sample_payload() })),
            );
            req.headers_mut()
                .insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
            req.extensions_mut()
                .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 40_000))));
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::CREATED);

            let (_, body) = send(
                &app,
                request("GET", "/v1/secure-geo/proj-1/audit", Some("admin"), None),
            )
            .await;
            assert_eq!(body["data"][0]["action"], "created");
            assert_eq!(body["data"][0]["ipAddress"], expected);
        }
    }

    #[test]
    fn openapi_lists_secure_geo_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/secure-geo/{projectId}"));
        assert!(doc.paths.paths.contains_key("/v1/secure-geo/migrate"));
    }
}
