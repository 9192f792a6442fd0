//! Fixtures shared by unit tests: RSA keys, token minting, and test doubles.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;

use crate::auth::keys::{FetchError, InstallKeyFetcher, MockInstallKeyFetcher};
use crate::crypto::{DerivedKey, SecretCodec};

/// Key pair standing in for the platform's install signing key.
pub const INSTALL_KEY_PEM: &str = include_str!("auth/testdata/install_key.pem");
pub const INSTALL_KEY_PUB_PEM: &str = include_str!("auth/testdata/install_key.pub.pem");

/// Private key the install-key authority does not know about.
pub const ROGUE_KEY_PEM: &str = include_str!("auth/testdata/rogue_key.pem");

/// The only kid the fake authority publishes.
pub const INSTALL_KID: &str = "install-key-1";

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn test_codec() -> SecretCodec {
    SecretCodec::new(Arc::new(DerivedKey::derive(b"correct horse battery staple")))
}

/// RS256 token shaped like a platform lifecycle callback.
pub fn lifecycle_token(kid: Option<&str>, private_pem: &str, exp: i64) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_owned);
    let claims = json!({
        "iss": "platform",
        "aud": "https://app.example.com",
        "iat": now(),
        "exp": exp,
        "qsh": "context-qsh",
    });
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("test RSA key");
    jsonwebtoken::encode(&header, &claims, &key).expect("encode lifecycle token")
}

/// HS256 token shaped like a tenant request.
pub fn client_token(iss: &str, shared_secret: &str, exp: i64) -> String {
    let claims = json!({
        "iss": iss,
        "iat": now(),
        "exp": exp,
        "qsh": "context-qsh",
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(shared_secret.as_bytes()),
    )
    .expect("encode client token")
}

/// Fetcher that knows [`INSTALL_KID`] and answers 404 for anything else.
pub fn install_key_fetcher() -> Arc<dyn InstallKeyFetcher> {
    let mut fetcher = MockInstallKeyFetcher::new();
    fetcher.expect_fetch().returning(|kid: &str| {
        if kid == INSTALL_KID {
            Ok(INSTALL_KEY_PUB_PEM.to_owned())
        } else {
            Err(FetchError::Status(404))
        }
    });
    Arc::new(fetcher)
}
