//! Configuration loading and validation for the connect app service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.
//! `APP_SECRET` is the only hard requirement.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Operator-provisioned master secret the at-rest encryption key is derived from.
///
/// Never logged: `Debug` is redacted and the bytes are zeroed on drop.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct MasterSecret(String);

impl MasterSecret {
    #[cfg(test)]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Master secret for tenant-record encryption. **Required.**
    pub app_secret: MasterSecret,

    /// App key advertised in the descriptor.
    #[serde(default = "default_app_key")]
    pub app_key: String,

    /// Display name advertised in the descriptor.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Development mode appends `.dev` to the app key so a dev install does
    /// not collide with the marketplace listing.
    #[serde(default)]
    pub dev_mode: bool,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base URL of the platform's install-key authority.
    #[serde(default = "default_install_keys_url")]
    pub install_keys_url: String,

    /// Timeout (seconds) for a single install-key fetch.
    #[serde(default = "default_install_key_timeout")]
    pub install_key_timeout_secs: u64,

    /// REST endpoint of the key-value store. Unset selects the in-memory store.
    #[serde(default)]
    pub kv_rest_api_url: Option<String>,

    /// Bearer token for the key-value REST endpoint.
    #[serde(default)]
    pub kv_rest_api_token: Option<String>,

    /// OTLP endpoint; span export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_app_key() -> String {
    "com.example.connect-app".into()
}
fn default_app_name() -> String {
    "Connect App".into()
}
fn default_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".into()
}
fn default_install_keys_url() -> String {
    "https://connect-install-keys.atlassian.com".into()
}
fn default_install_key_timeout() -> u64 {
    5
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration (is APP_SECRET set?)")?;

        c.validate()?;
        Ok(c)
    }

    /// App key with the development suffix applied.
    pub fn effective_app_key(&self) -> String {
        if self.dev_mode {
            format!("{}.dev", self.app_key)
        } else {
            self.app_key.clone()
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.app_secret.is_blank() {
            anyhow::bail!("APP_SECRET environment variable is not set");
        }
        ensure_non_empty(&self.app_key, "APP_KEY")?;
        ensure_non_empty(&self.install_keys_url, "INSTALL_KEYS_URL")?;

        if self.install_key_timeout_secs == 0 {
            anyhow::bail!("INSTALL_KEY_TIMEOUT_SECS must be > 0");
        }
        match (&self.kv_rest_api_url, &self.kv_rest_api_token) {
            (Some(url), _) if url.trim().is_empty() => {
                anyhow::bail!("KV_REST_API_URL must not be empty when set")
            }
            (Some(_), None) => anyhow::bail!("KV_REST_API_TOKEN is required with KV_REST_API_URL"),
            _ => {}
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
