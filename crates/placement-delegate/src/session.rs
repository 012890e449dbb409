//! Engine session acquisition.
//!
//! A session is acquired once per placement decision and dropped when the
//! decision completes. The token travels as the `JSESSIONID` cookie and is
//! never logged.

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{AuthErrorKind, DelegateError, DelegateResult};
use crate::transport::{EngineTransport, TransportFailure};

/// Name of the session cookie issued by the engine.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// A short-lived engine session.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    /// Unix timestamp (seconds) when the session was acquired.
    acquired_at: u64,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            acquired_at: epoch_secs(),
        }
    }

    pub fn acquired_at(&self) -> u64 {
        self.acquired_at
    }

    /// `Cookie` header value carrying the session token.
    pub(crate) fn cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.token.expose_secret())
    }
}

/// Logs in to the engine with the configured credentials.
#[derive(Debug, Clone)]
pub struct SessionManager {
    transport: EngineTransport,
    username: String,
    password: SecretString,
}

impl SessionManager {
    pub fn new(transport: EngineTransport, config: &EngineConfig) -> Self {
        Self {
            transport,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Acquire a fresh session. Single attempt, no retry.
    pub async fn acquire(&self) -> DelegateResult<Session> {
        let url = self.transport.url("login");
        info!(%url, username = %self.username, "logging in to placement engine");

        let response = self
            .transport
            .client()
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| login_failure(TransportFailure::from_reqwest("POST", &url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(username = %self.username, %status, "placement engine rejected login");
            return Err(DelegateError::authentication(
                AuthErrorKind::Rejected,
                format!("error authenticating as {}: HTTP {status}", self.username),
            ));
        }

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                warn!(username = %self.username, "login response carried no session cookie");
                DelegateError::authentication(
                    AuthErrorKind::MissingToken,
                    format!("no {SESSION_COOKIE} cookie in login response for {}", self.username),
                )
            })?;

        info!(username = %self.username, "authenticated");
        Ok(Session::new(token))
    }
}

fn login_failure(failure: TransportFailure) -> DelegateError {
    let kind = if failure.timed_out {
        warn!(detail = %failure.detail, "login request timed out");
        AuthErrorKind::Timeout
    } else {
        AuthErrorKind::Transport
    };
    DelegateError::authentication(kind, failure.detail)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
