//! [`BlobStore`]: the string key-value seam tenant records are written through.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by a blob store backend.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The store could not be reached or answered with something unparseable.
    #[error("key-value transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with an explicit error.
    #[error("key-value store error: {0}")]
    Remote(String),

    /// The store answered successfully with a value of the wrong shape.
    #[error("unexpected key-value response")]
    UnexpectedResponse,
}

/// Minimal string key-value interface. No TTL, no versioning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError>;

    /// Read the value under `key`, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, BlobError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn del(&self, key: &str) -> Result<(), BlobError>;

    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}

/// Process-local store used when no REST endpoint is configured.
///
/// Contents are lost on restart, so installs must be replayed by the platform.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        self.inner
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn del(&self, key: &str) -> Result<(), BlobError> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
