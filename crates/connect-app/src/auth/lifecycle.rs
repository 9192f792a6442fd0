//! Verification of the platform's signed `installed` / `uninstalled` callbacks.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use super::keys::{FetchError, InstallKeyFetcher};
use super::{Rejection, Verdict};

/// Checks that a lifecycle token is RS256-signed by the key the install-key
/// authority publishes under the token's `kid`.
///
/// Claims are not interpreted beyond `exp` and `nbf`, which are checked with no
/// clock leeway when present. Binding the body to the token is the caller's concern.
#[derive(Clone)]
pub struct LifecycleVerifier {
    fetcher: Arc<dyn InstallKeyFetcher>,
}

impl LifecycleVerifier {
    pub fn new(fetcher: Arc<dyn InstallKeyFetcher>) -> Self {
        Self { fetcher }
    }

    /// `true` only when the token verifies. Every failure collapses to `false`.
    pub async fn verify_lifecycle_request(&self, token: Option<&str>) -> bool {
        self.verify(token).await.is_verified()
    }

    pub async fn verify(&self, token: Option<&str>) -> Verdict {
        match self.check(token).await {
            Ok(()) => Verdict::Verified(()),
            Err(reason) => {
                debug!(%reason, "lifecycle token rejected");
                Verdict::Rejected(reason)
            }
        }
    }

    async fn check(&self, token: Option<&str>) -> Result<(), Rejection> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(Rejection::MissingToken)?;

        let header = jsonwebtoken::decode_header(token).map_err(|_| Rejection::MalformedToken)?;
        let kid = header
            .kid
            .filter(|k| !k.is_empty())
            .ok_or(Rejection::MissingKeyId)?;

        let pem = self.fetcher.fetch(&kid).await.map_err(|e| {
            if matches!(e, FetchError::Transport(_) | FetchError::Status(_)) {
                warn!(error = %e, kid = %kid, "install key fetch failed");
            }
            Rejection::KeyFetch(e)
        })?;
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|_| Rejection::InvalidKey)?;

        jsonwebtoken::decode::<serde_json::Value>(token, &key, &lifecycle_validation())
            .map_err(|_| Rejection::BadSignature)?;
        Ok(())
    }
}

fn lifecycle_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.required_spec_claims.clear();
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation
}
