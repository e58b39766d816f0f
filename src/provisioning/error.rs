//! Provisioning error taxonomy

use reqwest::StatusCode;

/// Caller input rejected before any provisioning starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid request format")]
    MalformedBody(String),

    #[error("Subscription Key (Primary Key) is required")]
    MissingSubscriptionKey,
}

/// Which remote step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStep {
    RegisterIdentity,
    RegisterKey,
}

impl RemoteStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteStep::RegisterIdentity => "register_identity",
            RemoteStep::RegisterKey => "register_key",
        }
    }
}

impl std::fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure talking to the gateway. Never shown to the caller;
/// always converted into local fallback.
#[derive(Debug, thiserror::Error)]
pub enum RemoteFailure {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Gateway returned {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Malformed gateway response: {0}")]
    MalformedBody(String),
}

impl RemoteFailure {
    /// Classify a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteFailure::Timeout(err.to_string())
        } else if err.is_decode() || err.is_body() {
            RemoteFailure::MalformedBody(err.to_string())
        } else {
            RemoteFailure::Transport(err.to_string())
        }
    }
}

/// The OS random source could not be read
#[derive(Debug, thiserror::Error)]
#[error("Entropy source unavailable: {0}")]
pub struct EntropyError(#[from] pub rand::Error);
