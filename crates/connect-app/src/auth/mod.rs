//! Trust establishment with the platform and per-request tenant authentication.
//!
//! # Flow
//!
//! 1. `installed` / `uninstalled` callbacks carry an RS256 token whose `kid`
//!    names a public key at the install-key authority; [`LifecycleVerifier`]
//!    fetches that key and checks the signature.
//! 2. A verified install stores the tenant's shared secret (see [`crate::tenant`]).
//! 3. Every later tenant request carries an HS256 token with `iss = clientKey`;
//!    [`RequestVerifier`] checks it against the stored shared secret.
//!
//! # Error policy
//!
//! Internally each step yields a [`Rejection`] so tests and debug logs can see
//! why a token failed. The `verify_*` entry points only ever expose a `bool`,
//! and HTTP callers answer every rejection with the same 401.

pub mod keys;
pub mod lifecycle;
pub mod request;

pub use keys::{FetchError, HttpInstallKeyFetcher};
pub use lifecycle::LifecycleVerifier;
pub use request::{AuthenticatedClient, RequestVerifier};

use thiserror::Error;

/// Outcome of a verification. `T` is what a successful check establishes.
#[derive(Debug)]
pub enum Verdict<T = ()> {
    Verified(T),
    Rejected(Rejection),
}

impl<T> Verdict<T> {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified(_))
    }
}

impl<T> From<Result<T, Rejection>> for Verdict<T> {
    fn from(result: Result<T, Rejection>) -> Self {
        match result {
            Ok(value) => Verdict::Verified(value),
            Err(reason) => Verdict::Rejected(reason),
        }
    }
}

/// Why a token was rejected. Never sent to the remote peer.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("no token presented")]
    MissingToken,

    #[error("token is not a well-formed JWT")]
    MalformedToken,

    #[error("token header has no kid")]
    MissingKeyId,

    #[error("token has no issuer")]
    MissingIssuer,

    #[error("install key unavailable: {0}")]
    KeyFetch(#[source] FetchError),

    #[error("install key is not a usable RSA public key")]
    InvalidKey,

    /// Signature, algorithm, or expiry check failed.
    #[error("token failed verification")]
    BadSignature,

    #[error("issuer is not an installed tenant")]
    UnknownClient,

    #[error("stored tenant record failed to decrypt")]
    UndecryptableRecord,

    #[error("stored tenant record has no shared secret")]
    MissingSharedSecret,

    #[error("tenant store unavailable")]
    StoreUnavailable,
}

/// Strip the `JWT ` (platform convention) or `Bearer ` scheme from an
/// `Authorization` header value.
pub fn token_from_authorization(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("JWT") || scheme.eq_ignore_ascii_case("Bearer") {
        Some(token)
    } else {
        None
    }
}
