//! Shared HTTP plumbing for talking to the placement engine.
//!
//! One `reqwest::Client` per delegate, configured with the engine timeout
//! and TLS policy. Every call is a single attempt; callers map a
//! [`TransportFailure`] into the error kind of their own step.

use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{DelegateError, DelegateResult};
use crate::session::Session;

/// A failed round trip to the engine.
#[derive(Debug)]
pub(crate) struct TransportFailure {
    pub timed_out: bool,
    pub detail: String,
}

impl TransportFailure {
    pub fn from_reqwest(method: &str, url: &str, err: reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        let detail = if timed_out {
            format!("{method} {url} timed out")
        } else {
            format!("{method} {url}: {err}")
        };
        Self { timed_out, detail }
    }
}

/// An engine response: status plus the body decoded as JSON, or
/// `Value::Null` when the body is not JSON.
#[derive(Debug)]
pub(crate) struct EngineResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl EngineResponse {
    /// The engine's `message` field, present on most error bodies.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// HTTP client bound to the engine's REST endpoint.
#[derive(Debug, Clone)]
pub struct EngineTransport {
    client: Client,
    endpoint: String,
}

impl EngineTransport {
    pub fn new(config: &EngineConfig) -> DelegateResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| DelegateError::Config(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.rest_endpoint(),
        })
    }

    /// Absolute URL of an engine resource.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) async fn get_json(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<EngineResponse, TransportFailure> {
        let url = self.url(path);
        let request = self.client.get(&url).header(COOKIE, session.cookie());
        execute("GET", &url, request).await
    }

    pub(crate) async fn post_json<T: Serialize>(
        &self,
        session: &Session,
        path: &str,
        body: &T,
    ) -> Result<EngineResponse, TransportFailure> {
        let url = self.url(path);
        let request = self
            .client
            .post(&url)
            .header(COOKIE, session.cookie())
            .json(body);
        execute("POST", &url, request).await
    }
}

async fn execute(
    method: &str,
    url: &str,
    request: RequestBuilder,
) -> Result<EngineResponse, TransportFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| TransportFailure::from_reqwest(method, url, e))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportFailure::from_reqwest(method, url, e))?;

    let body = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        debug!(%url, %status, error = %e, "engine response is not JSON");
        Value::Null
    });

    Ok(EngineResponse { status, body })
}
