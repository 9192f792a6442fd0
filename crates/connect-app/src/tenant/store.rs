//! [`TenantStore`]: encrypted per-tenant credential records keyed by client key.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use super::blob::{BlobError, BlobStore};
use crate::crypto::{CodecError, SecretCodec};

/// Prefix of every tenant record key in the blob store.
pub const KEY_PREFIX: &str = "APP_INSTALL/";

/// Reserved record field holding the tenant's signing secret.
pub const SHARED_SECRET_FIELD: &str = "sharedSecret";

/// Errors produced by the tenant layer.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The stored blob did not decrypt under the current key.
    #[error(transparent)]
    Decrypt(#[from] CodecError),

    /// The decrypted record is not a JSON object.
    #[error("tenant record is not a JSON object: {0}")]
    Decode(#[from] serde_json::Error),

    /// The decrypted record has no usable `sharedSecret`.
    #[error("tenant record has no sharedSecret")]
    MissingSharedSecret,
}

/// One installed tenant: its shared secret plus platform-supplied metadata.
#[derive(Clone, PartialEq)]
pub struct TenantRecord {
    pub shared_secret: String,
    pub metadata: BTreeMap<String, Value>,
}

impl TenantRecord {
    /// Merge `metadata` with `shared_secret`; the explicit secret wins over any
    /// `sharedSecret` already present in the metadata.
    pub fn new(shared_secret: impl Into<String>, mut metadata: BTreeMap<String, Value>) -> Self {
        metadata.remove(SHARED_SECRET_FIELD);
        Self {
            shared_secret: shared_secret.into(),
            metadata,
        }
    }

    /// Serialise as one flat JSON object.
    pub fn to_json(&self) -> Result<String, TenantError> {
        let mut object: Map<String, Value> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        object.insert(
            SHARED_SECRET_FIELD.to_owned(),
            Value::String(self.shared_secret.clone()),
        );
        Ok(serde_json::to_string(&object)?)
    }

    /// Parse a flat JSON object, requiring a non-empty string `sharedSecret`.
    pub fn from_json(json: &str) -> Result<Self, TenantError> {
        let mut object: Map<String, Value> = serde_json::from_str(json)?;
        let shared_secret = match object.remove(SHARED_SECRET_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(TenantError::MissingSharedSecret),
        };
        Ok(Self {
            shared_secret,
            metadata: object.into_iter().collect(),
        })
    }
}

impl fmt::Debug for TenantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRecord")
            .field("shared_secret", &"[REDACTED]")
            .field("metadata", &self.metadata.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn storage_key(client_key: &str) -> String {
    format!("{KEY_PREFIX}{client_key}")
}

/// Encrypts tenant records with [`SecretCodec`] and keeps them in a [`BlobStore`].
///
/// Last write wins: concurrent installs for one client key are not serialised.
#[derive(Clone)]
pub struct TenantStore {
    blobs: Arc<dyn BlobStore>,
    codec: SecretCodec,
}

impl TenantStore {
    pub fn new(blobs: Arc<dyn BlobStore>, codec: SecretCodec) -> Self {
        Self { blobs, codec }
    }

    /// Backend name of the underlying blob store.
    pub fn backend(&self) -> &'static str {
        self.blobs.backend()
    }

    /// Store `shared_secret` and `metadata` for `client_key`, replacing any
    /// earlier installation.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Blob`] if the write fails.
    pub async fn authorize_client(
        &self,
        client_key: &str,
        shared_secret: &str,
        metadata: BTreeMap<String, Value>,
    ) -> Result<(), TenantError> {
        let record = TenantRecord::new(shared_secret, metadata);
        let ciphertext = self.codec.encrypt(&record.to_json()?);
        self.blobs.set(&storage_key(client_key), &ciphertext).await?;
        info!(client_key, "tenant authorised");
        Ok(())
    }

    /// Forget `client_key`. Succeeds when no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Blob`] if the delete fails.
    pub async fn unauthorize_client(&self, client_key: &str) -> Result<(), TenantError> {
        self.blobs.del(&storage_key(client_key)).await?;
        info!(client_key, "tenant unauthorised");
        Ok(())
    }

    /// Load and decrypt the record for `client_key`; `Ok(None)` if never installed.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Decrypt`] when the blob fails the codec's marker
    /// check, [`TenantError::MissingSharedSecret`] or [`TenantError::Decode`]
    /// when it decrypts to an unusable record.
    pub async fn load(&self, client_key: &str) -> Result<Option<TenantRecord>, TenantError> {
        let Some(ciphertext) = self.blobs.get(&storage_key(client_key)).await? else {
            return Ok(None);
        };
        let json = self.codec.decrypt(&ciphertext)?;
        TenantRecord::from_json(&json).map(Some)
    }
}
