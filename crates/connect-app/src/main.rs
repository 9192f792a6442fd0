//! `connect-app`: service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise tracing (and OTLP export when configured).
//! 3. Derive the record encryption key from the master secret.
//! 4. Select the blob store backend and build the [`TenantStore`].
//! 5. Build the install-key fetcher and the verifiers.
//! 6. Build the Axum router and start the HTTP server.

mod auth;
mod config;
mod crypto;
mod server;
mod telemetry;
mod tenant;

#[cfg(test)]
mod testing;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{info, warn};

use auth::{HttpInstallKeyFetcher, LifecycleVerifier};
use config::Config;
use crypto::{DerivedKey, SecretCodec};
use server::state::{AppIdentity, AppState};
use tenant::{BlobStore, MemoryBlobStore, RestKvStore, TenantStore};

/// Timeout for a single key-value store command.
const KV_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level, cfg.otel_exporter_otlp_endpoint.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        app_key = %cfg.effective_app_key(),
        "connect-app starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key derivation
    // -----------------------------------------------------------------------
    let codec = SecretCodec::new(Arc::new(DerivedKey::derive(cfg.app_secret.as_bytes())));

    // -----------------------------------------------------------------------
    // 4. Tenant store
    // -----------------------------------------------------------------------
    let blobs: Arc<dyn BlobStore> = match (&cfg.kv_rest_api_url, &cfg.kv_rest_api_token) {
        (Some(url), Some(token)) => Arc::new(RestKvStore::new(url, token, KV_TIMEOUT)?),
        _ => {
            warn!("KV_REST_API_URL not set; tenant records are kept in memory and lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
    };
    info!(store = blobs.backend(), "tenant store ready");
    let tenants = TenantStore::new(blobs, codec);

    // -----------------------------------------------------------------------
    // 5. Verifiers
    // -----------------------------------------------------------------------
    let fetcher = HttpInstallKeyFetcher::new(
        &cfg.install_keys_url,
        Duration::from_secs(cfg.install_key_timeout_secs),
    )?;
    let lifecycle = LifecycleVerifier::new(Arc::new(fetcher));

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let identity = AppIdentity {
        key: cfg.effective_app_key(),
        name: cfg.app_name.clone(),
    };
    let state = AppState::new(lifecycle, tenants, identity);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
