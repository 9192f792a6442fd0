//! Redis-over-REST [`BlobStore`] backend (Vercel KV / Upstash wire protocol).
//!
//! Every command is a `POST` of a JSON array such as `["GET","key"]` to the
//! base URL with a bearer token; the reply is `{"result":...}` or `{"error":"..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::blob::{BlobError, BlobStore};

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// [`BlobStore`] backed by a Redis REST endpoint.
#[derive(Clone, Debug)]
pub struct RestKvStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKvStore {
    /// Build a store for `url`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, BlobError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        })
    }

    async fn command(&self, args: &[&str]) -> Result<Value, BlobError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;
        let status = resp.status();
        let reply: CommandReply = resp.json().await?;

        if let Some(error) = reply.error {
            return Err(BlobError::Remote(error));
        }
        if !status.is_success() {
            return Err(BlobError::Remote(format!("HTTP {status}")));
        }
        Ok(reply.result)
    }
}

#[async_trait]
impl BlobStore for RestKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        // The JavaScript KV client JSON-encodes values; keep records readable by it.
        let encoded = serde_json::to_string(value).map_err(|_| BlobError::UnexpectedResponse)?;
        match self.command(&["SET", key, &encoded]).await? {
            Value::String(ok) if ok == "OK" => Ok(()),
            _ => Err(BlobError::UnexpectedResponse),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(raw) => Ok(Some(decode_stored(raw))),
            _ => Err(BlobError::UnexpectedResponse),
        }
    }

    async fn del(&self, key: &str) -> Result<(), BlobError> {
        self.command(&["DEL", key]).await.map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}

/// Unwrap a JSON-encoded string value, passing raw strings through.
fn decode_stored(raw: String) -> String {
    serde_json::from_str::<String>(&raw).unwrap_or(raw)
}
