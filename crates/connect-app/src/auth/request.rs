//! Verification of tenant-originated requests against the stored shared secret.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Rejection, Verdict};
use crate::tenant::{TenantError, TenantStore};

/// A request whose token verified against its tenant's shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClient {
    pub client_key: String,
}

#[derive(Deserialize)]
struct IssuerClaim {
    #[serde(default)]
    iss: Option<String>,
}

/// Resolves a token's `iss` to an installed tenant and checks its HS256
/// signature with that tenant's shared secret.
#[derive(Clone)]
pub struct RequestVerifier {
    tenants: TenantStore,
}

impl RequestVerifier {
    pub fn new(tenants: TenantStore) -> Self {
        Self { tenants }
    }

    /// `true` only when the token verifies. Every failure collapses to `false`.
    #[allow(dead_code)] // Boolean form for callers that do not need the tenant identity.
    pub async fn verify_client_request(&self, token: Option<&str>) -> bool {
        self.verify(token).await.is_verified()
    }

    /// Verify `token` and, on success, name the tenant it belongs to.
    ///
    /// A [`Verdict::Rejected`] reason is for logs only and must not be
    /// forwarded to the peer.
    pub async fn verify(&self, token: Option<&str>) -> Verdict<AuthenticatedClient> {
        let result = self.check(token).await;
        if let Err(reason) = &result {
            debug!(%reason, "tenant token rejected");
        }
        result.into()
    }

    async fn check(&self, token: Option<&str>) -> Result<AuthenticatedClient, Rejection> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(Rejection::MissingToken)?;
        let client_key = unverified_issuer(token)?;

        let record = match self.tenants.load(&client_key).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(Rejection::UnknownClient),
            Err(TenantError::Blob(e)) => {
                warn!(error = %e, "tenant store unavailable during request verification");
                return Err(Rejection::StoreUnavailable);
            }
            Err(TenantError::Decrypt(_)) => return Err(Rejection::UndecryptableRecord),
            Err(TenantError::Decode(_) | TenantError::MissingSharedSecret) => {
                return Err(Rejection::MissingSharedSecret)
            }
        };

        let key = DecodingKey::from_secret(record.shared_secret.as_bytes());
        jsonwebtoken::decode::<serde_json::Value>(token, &key, &request_validation())
            .map_err(|_| Rejection::BadSignature)?;

        Ok(AuthenticatedClient { client_key })
    }
}

/// Read `iss` without checking the signature; it only selects which secret to verify with.
fn unverified_issuer(token: &str) -> Result<String, Rejection> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<IssuerClaim>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| Rejection::MalformedToken)?;
    data.claims
        .iss
        .filter(|iss| !iss.is_empty())
        .ok_or(Rejection::MissingIssuer)
}

fn request_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation
}
