//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::auth::{LifecycleVerifier, RequestVerifier};
use crate::tenant::TenantStore;

/// Identity advertised in the app descriptor.
#[derive(Debug, Clone)]
pub struct AppIdentity {
    /// App key with any development suffix already applied.
    pub key: String,
    pub name: String,
}

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleVerifier,
    pub requests: RequestVerifier,
    pub tenants: TenantStore,
    pub identity: Arc<AppIdentity>,
}

impl AppState {
    /// Wire the verifiers around one shared [`TenantStore`].
    pub fn new(lifecycle: LifecycleVerifier, tenants: TenantStore, identity: AppIdentity) -> Self {
        Self {
            lifecycle,
            requests: RequestVerifier::new(tenants.clone()),
            tenants,
            identity: Arc::new(identity),
        }
    }
}
