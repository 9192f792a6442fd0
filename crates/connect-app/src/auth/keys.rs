//! Install-key authority client: PEM public keys by key id.
//!
//! Keys are fetched on every lifecycle verification. Nothing is cached and
//! failed fetches are not retried; the platform retries its webhooks instead.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while fetching an install key.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The key id would not form a single path segment.
    #[error("invalid key id")]
    InvalidKeyId,

    #[error("install key request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The authority answered with a non-success status (unknown kid → 404).
    #[error("install key authority returned HTTP {0}")]
    Status(u16),

    #[error("install key authority returned an empty body")]
    EmptyBody,
}

/// Source of the platform's per-install RSA public keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstallKeyFetcher: Send + Sync {
    /// Return the PEM-encoded public key published under `kid`.
    async fn fetch(&self, kid: &str) -> Result<String, FetchError>;
}

/// [`InstallKeyFetcher`] that calls `GET {base_url}/{kid}`.
#[derive(Clone, Debug)]
pub struct HttpInstallKeyFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInstallKeyFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl InstallKeyFetcher for HttpInstallKeyFetcher {
    async fn fetch(&self, kid: &str) -> Result<String, FetchError> {
        if !is_path_safe(kid) {
            return Err(FetchError::InvalidKeyId);
        }
        let resp = self
            .client
            .get(format!("{}/{kid}", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}

/// The kid comes from an unverified header, so keep it to one plain path segment.
fn is_path_safe(kid: &str) -> bool {
    !kid.is_empty()
        && kid != "."
        && kid != ".."
        && !kid
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}
