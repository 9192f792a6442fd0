//! At-rest encryption of tenant records.
//!
//! This module is intentionally free of HTTP and storage dependencies.
//!
//! # Ciphertext format
//!
//! ```text
//! hex( AES-256-CBC( key, iv = 0^16, "==" <pad:1 hex> "-" <nonce:10> "==" <text> "="*pad ) )
//! ```
//!
//! The format is kept byte-compatible with records already in the store, so
//! it cannot be swapped for an AEAD without migrating every record.

pub mod codec;
pub mod kdf;

pub use codec::{CodecError, SecretCodec};
pub use kdf::DerivedKey;
