//! Per-tenant credential persistence.
//!
//! # Lifecycle
//!
//! 1. A verified `installed` callback calls [`TenantStore::authorize_client`],
//!    which encrypts the record and writes it under `APP_INSTALL/<clientKey>`.
//! 2. Every tenant request loads the record back through [`TenantStore::load`].
//! 3. A verified `uninstalled` callback deletes the blob.
//!
//! # Security invariants
//!
//! - Records only ever reach the blob store as [`crate::crypto::SecretCodec`] ciphertext.
//! - Shared secrets are never logged; [`store::TenantRecord`]'s `Debug` is redacted.

pub mod blob;
pub mod rest;
pub mod store;

pub use blob::{BlobError, BlobStore, MemoryBlobStore};
pub use rest::RestKvStore;
pub use store::{TenantError, TenantStore};
