//! Request and response types exchanged with the platform and with operators.
//!
//! Field names follow the platform's camelCase JSON conventions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lifecycle webhooks
// ---------------------------------------------------------------------------

/// Body of the platform's `installed` / `uninstalled` lifecycle callbacks.
///
/// Only `clientKey` and `sharedSecret` are interpreted; every other field is
/// kept verbatim in `extra` and stored alongside the tenant record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePayload {
    /// Platform-assigned tenant identifier.
    #[serde(default)]
    pub client_key: String,
    /// Symmetric secret the tenant will sign requests with. Absent on uninstall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    /// Remaining installation metadata (`baseUrl`, `productType`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LifecyclePayload {
    /// The whole payload as a flat metadata map, `clientKey` included.
    ///
    /// `sharedSecret` is left out; the tenant store writes it separately.
    pub fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut map = self.extra.clone();
        map.insert(
            "clientKey".to_owned(),
            serde_json::Value::String(self.client_key.clone()),
        );
        map
    }
}

// ---------------------------------------------------------------------------
// App descriptor
// ---------------------------------------------------------------------------

/// App descriptor served to the platform at install time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub key: String,
    pub name: String,
    pub base_url: String,
    pub authentication: Authentication,
    pub lifecycle: Lifecycle,
    pub api_migrations: BTreeMap<String, bool>,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lifecycle {
    pub installed: String,
    pub uninstalled: String,
}

// ---------------------------------------------------------------------------
// Tenant API
// ---------------------------------------------------------------------------

/// Response body for `GET /jira/api/whoami`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub client_key: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"unauthorized"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
    /// Which blob store backend holds tenant records: `"memory"` or `"rest"`.
    pub store: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lifecycle_payload_keeps_unknown_fields() {
        let payload: LifecyclePayload = serde_json::from_value(json!({
            "key": "com.example.app",
            "clientKey": "tenant-1",
            "sharedSecret": "secret-abc",
            "baseUrl": "https://tenant-1.example.net",
            "eventType": "installed"
        }))
        .unwrap();
        assert_eq!(payload.client_key, "tenant-1");
        assert_eq!(payload.shared_secret.as_deref(), Some("secret-abc"));
        assert_eq!(payload.extra["baseUrl"], "https://tenant-1.example.net");
        assert!(!payload.extra.contains_key("sharedSecret"));
    }

    #[test]
    fn uninstall_payload_has_no_secret() {
        let payload: LifecyclePayload =
            serde_json::from_value(json!({"clientKey": "tenant-1", "eventType": "uninstalled"}))
                .unwrap();
        assert!(payload.shared_secret.is_none());
    }

    #[test]
    fn metadata_includes_client_key_but_not_secret() {
        let payload = LifecyclePayload {
            client_key: "tenant-1".into(),
            shared_secret: Some("secret-abc".into()),
            extra: BTreeMap::from([("foo".to_owned(), json!("bar"))]),
        };
        let meta = payload.metadata();
        assert_eq!(meta["clientKey"], "tenant-1");
        assert_eq!(meta["foo"], "bar");
        assert!(!meta.contains_key("sharedSecret"));
    }

    #[test]
    fn descriptor_uses_platform_field_names() {
        let d = Descriptor {
            key: "com.example.app".into(),
            name: "App".into(),
            base_url: "https://app.example.com".into(),
            authentication: Authentication { kind: "jwt".into() },
            lifecycle: Lifecycle {
                installed: "/jira/installed".into(),
                uninstalled: "/jira/uninstalled".into(),
            },
            api_migrations: BTreeMap::from([("signed-install".to_owned(), true)]),
            scopes: vec!["READ".into()],
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["baseUrl"], "https://app.example.com");
        assert_eq!(v["authentication"]["type"], "jwt");
        assert_eq!(v["apiMigrations"]["signed-install"], true);
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("bad_request", "missing clientKey");
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("missing clientKey"));
    }
}
