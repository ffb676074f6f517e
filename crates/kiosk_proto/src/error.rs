use kiosk_crypto::CryptoError;
use thiserror::Error;

/// Every way an envelope can fail to be produced or consumed.
///
/// Variants stay distinct so callers can tell a broken message apart from a
/// tampered or misrouted one.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("AAD mismatch: envelope is bound to {actual:?}, expected {expected:?}")]
    AadMismatch { expected: String, actual: String },

    #[error("Envelope encryption failed")]
    Encryption,

    #[error("Envelope authentication failed (wrong secret, corruption or tampering)")]
    Authentication,

    #[error("Decrypted payload is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid API path: {0}")]
    InvalidPath(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[source] serde_json::Error),
}

impl From<CryptoError> for CodecError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Derivation(msg) | CryptoError::InvalidSecret(msg) => Self::Derivation(msg),
            CryptoError::Authentication => Self::Authentication,
            CryptoError::AeadEncrypt => Self::Encryption,
        }
    }
}

impl CodecError {
    /// Integrity failures: the message was altered, misrouted, or keyed with
    /// a different secret.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Authentication | Self::AadMismatch { .. })
    }
}
