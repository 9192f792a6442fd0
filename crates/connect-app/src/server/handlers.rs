//! Axum request handlers for all service endpoints.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::HOST, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use common::protocol::{
    Authentication, Descriptor, ErrorResponse, HealthResponse, Lifecycle, LifecyclePayload,
    WhoAmIResponse,
};
use common::ServiceError;
use tracing::{info, warn};

use super::{middleware::bearer_token, state::AppState};
use crate::auth::AuthenticatedClient;
use crate::tenant::TenantError;

pub const INSTALLED_PATH: &str = "/jira/installed";
pub const UNINSTALLED_PATH: &str = "/jira/uninstalled";

/// Render a [`ServiceError`] as a JSON error response with its mapped status.
pub fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &err {
        ServiceError::Unauthorized => "Unauthorized".to_owned(),
        ServiceError::BadRequest(m) | ServiceError::Unavailable(m) | ServiceError::Internal(m) => {
            m.clone()
        }
    };
    (status, Json(ErrorResponse::new(err.code(), message))).into_response()
}

fn store_failure(e: TenantError) -> ServiceError {
    match e {
        TenantError::Blob(_) => ServiceError::Unavailable("tenant store unavailable".into()),
        _ => ServiceError::Internal("failed to update tenant record".into()),
    }
}

/// Verify the lifecycle token, then parse the body. The body is not looked at
/// for unauthenticated callers.
async fn verified_payload(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<LifecyclePayload, ServiceError> {
    if !state
        .lifecycle
        .verify_lifecycle_request(bearer_token(headers))
        .await
    {
        return Err(ServiceError::Unauthorized);
    }
    let payload: LifecyclePayload = serde_json::from_slice(body)
        .map_err(|_| ServiceError::BadRequest("invalid lifecycle payload".into()))?;
    if payload.client_key.trim().is_empty() {
        return Err(ServiceError::BadRequest("missing clientKey".into()));
    }
    Ok(payload)
}

/// `POST /jira/installed`: store the new tenant's shared secret.
pub async fn installed(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload = match verified_payload(&state, &headers, &body).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };
    let Some(secret) = payload.shared_secret.as_deref().filter(|s| !s.is_empty()) else {
        return error_response(ServiceError::BadRequest("missing sharedSecret".into()));
    };

    match state
        .tenants
        .authorize_client(&payload.client_key, secret, payload.metadata())
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!(error = %e, client_key = %payload.client_key, "failed to store installation");
            error_response(store_failure(e))
        }
    }
}

/// `POST /jira/uninstalled`: forget the tenant.
pub async fn uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match verified_payload(&state, &headers, &body).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state.tenants.unauthorize_client(&payload.client_key).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!(error = %e, client_key = %payload.client_key, "failed to remove installation");
            error_response(store_failure(e))
        }
    }
}

/// `GET /jira/descriptor`: app descriptor with `baseUrl` taken from the `Host` header.
pub async fn descriptor(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    info!(host, "serving app descriptor");

    let body = Descriptor {
        key: state.identity.key.clone(),
        name: state.identity.name.clone(),
        base_url: format!("https://{host}"),
        authentication: Authentication { kind: "jwt".into() },
        lifecycle: Lifecycle {
            installed: INSTALLED_PATH.into(),
            uninstalled: UNINSTALLED_PATH.into(),
        },
        api_migrations: BTreeMap::from([("signed-install".to_owned(), true)]),
        scopes: vec!["READ".into()],
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /jira/api/whoami`: echo the authenticated tenant.
pub async fn whoami(Extension(client): Extension<AuthenticatedClient>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        client_key: client.client_key,
    })
}

/// `GET /health`: liveness check.
pub async fn health(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        store: state.tenants.backend().into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
