//! Placement delegate error types.

use std::fmt;

use thiserror::Error;

/// Why a login attempt against the engine failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The engine answered with a non-success status.
    Rejected,
    /// The engine accepted the login but set no session cookie.
    MissingToken,
    Timeout,
    Transport,
}

/// Why an identifier lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    DatacenterNotFound,
    TemplateNotFound,
    Timeout,
    Transport,
}

/// Why a reservation submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementErrorKind {
    /// Non-200 answer to the reservation request.
    EngineRejected,
    Timeout,
    Transport,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rejected => "rejected",
            Self::MissingToken => "missing session token",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DatacenterNotFound => "datacenter not found",
            Self::TemplateNotFound => "template not found",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PlacementErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EngineRejected => "engine rejected",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Errors that terminate a placement decision.
#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("authentication failed ({kind}): {detail}")]
    Authentication { kind: AuthErrorKind, detail: String },

    #[error("resolution failed ({kind}): {detail}")]
    Resolution {
        kind: ResolutionErrorKind,
        detail: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("placement failed ({kind}): {detail}")]
    Placement {
        kind: PlacementErrorKind,
        detail: String,
    },

    #[error("no valid host found: {reason}")]
    NoValidHost { reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl DelegateError {
    pub fn authentication(kind: AuthErrorKind, detail: impl Into<String>) -> Self {
        Self::Authentication {
            kind,
            detail: detail.into(),
        }
    }

    pub fn resolution(kind: ResolutionErrorKind, detail: impl Into<String>) -> Self {
        Self::Resolution {
            kind,
            detail: detail.into(),
        }
    }

    pub fn placement(kind: PlacementErrorKind, detail: impl Into<String>) -> Self {
        Self::Placement {
            kind,
            detail: detail.into(),
        }
    }

    /// Whether the decision was aborted by the per-call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Authentication {
                kind: AuthErrorKind::Timeout,
                ..
            } | Self::Resolution {
                kind: ResolutionErrorKind::Timeout,
                ..
            } | Self::Placement {
                kind: PlacementErrorKind::Timeout,
                ..
            }
        )
    }
}

pub type DelegateResult<T> = Result<T, DelegateError>;
