//! Axum middleware: request timeout and tenant JWT authentication.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use common::ServiceError;

use super::{handlers::error_response, state::AppState};
use crate::auth::{token_from_authorization, Verdict};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token from the `Authorization` header, scheme stripped.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_authorization)
}

/// Reject requests whose token does not verify against an installed tenant;
/// otherwise expose the tenant to handlers as an `AuthenticatedClient` extension.
pub async fn require_client_jwt(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers()).map(str::to_owned);
    match state.requests.verify(token.as_deref()).await {
        Verdict::Verified(client) => {
            req.extensions_mut().insert(client);
            next.run(req).await
        }
        Verdict::Rejected(_) => error_response(ServiceError::Unauthorized),
    }
}
