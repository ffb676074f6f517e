use kiosk_proto::CodecError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Envelope could not be produced or trusted. Never retried here.
    #[error("Secure channel error: {0}")]
    Codec(#[from] CodecError),

    /// Network-level failure, orthogonal to the crypto layer.
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `body` is the decrypted error payload when the
    /// server sent an envelope we could open, otherwise the raw body.
    #[error("HTTP {status}")]
    Status { status: StatusCode, body: Value },

    #[error("Response body is not valid JSON for the requested type: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// 401/403 — the bearer token was rejected and has been dropped.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Tampering, misrouting or wrong secret, as opposed to a network fault.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Codec(err) if err.is_integrity_failure())
    }

    /// Stable code for UI layers, matching the codes the kiosk app displays.
    pub fn code(&self) -> String {
        match self {
            Self::Codec(err) if err.is_integrity_failure() => "SECURITY_VIOLATION".into(),
            Self::Codec(_) => "PROTOCOL_ERROR".into(),
            Self::Transport(_) => "NETWORK_ERROR".into(),
            Self::Status { .. } if self.is_auth_expired() => "AUTH_EXPIRED".into(),
            Self::Status { status, .. } => format!("HTTP_{}", status.as_u16()),
            Self::InvalidBody(_) => "INVALID_RESPONSE".into(),
            Self::InvalidUrl(_) => "INVALID_URL".into(),
        }
    }
}
