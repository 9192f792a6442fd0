//! Axum router construction.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    let tenant_api = Router::new()
        .route("/whoami", get(handlers::whoami))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_client_jwt));

    Router::new()
        .route("/jira/descriptor", get(handlers::descriptor))
        .route(handlers::INSTALLED_PATH, post(handlers::installed))
        .route(handlers::UNINSTALLED_PATH, post(handlers::uninstalled))
        .nest("/jira/api", tenant_api)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{
            header::{AUTHORIZATION, HOST},
            HeaderValue, Request, StatusCode,
        },
    };
    use axum_test::TestServer;
    use common::protocol::{Descriptor, ErrorResponse, HealthResponse, WhoAmIResponse};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::auth::LifecycleVerifier;
    use crate::server::state::AppIdentity;
    use crate::tenant::blob::MockBlobStore;
    use crate::tenant::{BlobError, BlobStore, MemoryBlobStore, TenantStore};
    use crate::testing::{
        client_token, install_key_fetcher, lifecycle_token, now, test_codec, INSTALL_KEY_PEM,
        INSTALL_KID, ROGUE_KEY_PEM,
    };

    fn test_state() -> (AppState, MemoryBlobStore) {
        let blobs = MemoryBlobStore::new();
        let tenants = TenantStore::new(Arc::new(blobs.clone()), test_codec());
        let state = AppState::new(
            LifecycleVerifier::new(install_key_fetcher()),
            tenants,
            AppIdentity {
                key: "com.example.connect-app.dev".into(),
                name: "Connect App".into(),
            },
        );
        (state, blobs)
    }

    fn server_over(blobs: impl BlobStore + 'static) -> TestServer {
        let state = AppState::new(
            LifecycleVerifier::new(install_key_fetcher()),
            TenantStore::new(Arc::new(blobs), test_codec()),
            AppIdentity {
                key: "com.example.connect-app".into(),
                name: "Connect App".into(),
            },
        );
        TestServer::new(build(state)).unwrap()
    }

    fn test_server() -> (TestServer, MemoryBlobStore) {
        let (state, blobs) = test_state();
        (TestServer::new(build(state)).unwrap(), blobs)
    }

    fn jwt_header(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("JWT {token}")).unwrap()
    }

    fn platform_token() -> String {
        lifecycle_token(Some(INSTALL_KID), INSTALL_KEY_PEM, now() + 180)
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (state, _) = test_state();
        let app = build(state);
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_reports_store_backend() {
        let (server, _) = test_server();
        let resp = server.get("/health").await;
        resp.assert_status_ok();
        let body: HealthResponse = resp.json();
        assert_eq!(body.status, "ok");
        assert_eq!(body.store, "memory");
    }

    #[tokio::test]
    async fn descriptor_uses_host_header() {
        let (state, _) = test_state();
        let req = Request::builder()
            .uri("/jira/descriptor")
            .header(HOST, "app.example.com")
            .body(Body::empty())
            .unwrap();
        let resp = build(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let d: Descriptor = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(d.base_url, "https://app.example.com");
        assert_eq!(d.key, "com.example.connect-app.dev");
        assert_eq!(d.lifecycle.installed, "/jira/installed");
        assert_eq!(d.authentication.kind, "jwt");
    }

    #[tokio::test]
    async fn install_without_token_is_unauthorized() {
        let (server, blobs) = test_server();
        let resp = server
            .post("/jira/installed")
            .json(&json!({"clientKey": "tenant-1", "sharedSecret": "secret-abc"}))
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "unauthorized");
        assert!(blobs.get("APP_INSTALL/tenant-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn install_with_forged_token_is_unauthorized() {
        let (server, blobs) = test_server();
        let forged = lifecycle_token(Some(INSTALL_KID), ROGUE_KEY_PEM, now() + 180);
        let resp = server
            .post("/jira/installed")
            .add_header(AUTHORIZATION, jwt_header(&forged))
            .json(&json!({"clientKey": "tenant-1", "sharedSecret": "attacker"}))
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
        assert!(blobs.get("APP_INSTALL/tenant-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthorized_body_is_not_parsed() {
        let (server, _) = test_server();
        let resp = server
            .post("/jira/installed")
            .text("{not json")
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn install_requires_client_key_and_secret() {
        let (server, _) = test_server();
        for body in [
            json!({"sharedSecret": "secret-abc"}),
            json!({"clientKey": "tenant-1"}),
            json!({"clientKey": "tenant-1", "sharedSecret": ""}),
        ] {
            let resp = server
                .post("/jira/installed")
                .add_header(AUTHORIZATION, jwt_header(&platform_token()))
                .json(&body)
                .await;
            resp.assert_status(StatusCode::BAD_REQUEST);
        }

        let resp = server
            .post("/jira/installed")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .text("{not json")
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn install_request_uninstall_end_to_end() {
        let (server, blobs) = test_server();

        server
            .post("/jira/installed")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({
                "clientKey": "tenant-1",
                "sharedSecret": "secret-abc",
                "foo": "bar",
            }))
            .await
            .assert_status_ok();

        let stored = blobs.get("APP_INSTALL/tenant-1").await.unwrap().unwrap();
        assert!(!stored.contains("secret-abc"));

        let tenant_token = client_token("tenant-1", "secret-abc", now() + 180);
        let resp = server
            .get("/jira/api/whoami")
            .add_header(AUTHORIZATION, jwt_header(&tenant_token))
            .await;
        resp.assert_status_ok();
        let who: WhoAmIResponse = resp.json();
        assert_eq!(who.client_key, "tenant-1");

        server
            .post("/jira/uninstalled")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({"clientKey": "tenant-1"}))
            .await
            .assert_status_ok();

        server
            .get("/jira/api/whoami")
            .add_header(AUTHORIZATION, jwt_header(&tenant_token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tenant_route_rejects_bad_tokens() {
        let (server, _) = test_server();
        server
            .post("/jira/installed")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({"clientKey": "tenant-1", "sharedSecret": "secret-abc"}))
            .await
            .assert_status_ok();

        server
            .get("/jira/api/whoami")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let wrong_secret = client_token("tenant-1", "guess", now() + 180);
        server
            .get("/jira/api/whoami")
            .add_header(AUTHORIZATION, jwt_header(&wrong_secret))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let bearer = client_token("tenant-1", "secret-abc", now() + 180);
        server
            .get("/jira/api/whoami")
            .add_header(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {bearer}")).unwrap(),
            )
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn uninstall_of_unknown_tenant_succeeds() {
        let (server, _) = test_server();
        server
            .post("/jira/uninstalled")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({"clientKey": "never-installed"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn store_outage_on_lifecycle_is_unavailable() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_set()
            .returning(|_, _| Err(BlobError::Remote("ERR internal shard 7".into())));
        blobs
            .expect_del()
            .returning(|_| Err(BlobError::Remote("ERR internal shard 7".into())));
        let server = server_over(blobs);

        let resp = server
            .post("/jira/installed")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({"clientKey": "tenant-1", "sharedSecret": "secret-abc"}))
            .await;
        resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(!resp.text().contains("shard"));
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "service_unavailable");

        let resp = server
            .post("/jira/uninstalled")
            .add_header(AUTHORIZATION, jwt_header(&platform_token()))
            .json(&json!({"clientKey": "tenant-1"}))
            .await;
        resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(!resp.text().contains("shard"));
    }
}
