//! Transport adapter — wraps request bodies and unwraps response bodies.
//!
//! Pure transforms over bytes and status codes so they can be driven by any
//! HTTP stack. Each exchange stands alone: no session key, no handshake.

use kiosk_proto::{EncryptionMode, Envelope, EnvelopeCodec};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ApiError;

/// Which AAD a response envelope must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAadPolicy {
    /// Response must be bound to the request path.
    #[default]
    RequestPath,
    /// Accept whatever AAD the server stamped. The tag still covers it.
    Any,
}

/// Body and negotiation header to put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub body: Option<Vec<u8>>,
    pub encryption_header: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResponse {
    pub status: StatusCode,
    pub body: Value,
    /// True when `body` came out of an envelope.
    pub decrypted: bool,
}

#[derive(Debug, Clone)]
pub struct SecureTransport {
    codec: EnvelopeCodec,
    response_aad: ResponseAadPolicy,
}

impl SecureTransport {
    pub fn new(codec: EnvelopeCodec, response_aad: ResponseAadPolicy) -> Self {
        Self { codec, response_aad }
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Replace `body` with its envelope when encryption is on.
    ///
    /// The header is set even without a body so the server encrypts its reply.
    pub fn seal_request(
        &self,
        mode: EncryptionMode,
        path: &str,
        body: Option<&Value>,
    ) -> Result<OutgoingRequest, ApiError> {
        let body = match (mode, body) {
            (_, None) => None,
            (EncryptionMode::Enabled, Some(payload)) => {
                let envelope = self.codec.encrypt(payload, path)?;
                Some(envelope.to_json()?.into_bytes())
            }
            (EncryptionMode::Disabled, Some(payload)) => {
                Some(serde_json::to_vec(payload).map_err(ApiError::InvalidBody)?)
            }
        };
        Ok(OutgoingRequest {
            body,
            encryption_header: mode.header_value(),
        })
    }

    /// Turn a received body into the payload the caller asked for.
    ///
    /// 2xx bodies under encryption must be envelopes; their errors surface
    /// unchanged. Error bodies are only opened when they look like an
    /// envelope, and a failed open falls back to the raw body. An empty body
    /// (204, or whitespace) yields `{}` so typed callers with defaulted
    /// fields still deserialise.
    pub fn open_response(
        &self,
        mode: EncryptionMode,
        path: &str,
        status: StatusCode,
        body: &[u8],
    ) -> Result<DecodedResponse, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(DecodedResponse { status, body: json!({}), decrypted: false });
        }
        let expected = match self.response_aad {
            ResponseAadPolicy::RequestPath => Some(path),
            ResponseAadPolicy::Any => None,
        };

        if status.is_success() {
            if !mode.is_enabled() {
                let body = serde_json::from_slice(body).map_err(ApiError::InvalidBody)?;
                return Ok(DecodedResponse { status, body, decrypted: false });
            }
            let envelope = Envelope::from_slice(body)?;
            let body = self.codec.decrypt(&envelope, expected)?;
            return Ok(DecodedResponse { status, body, decrypted: true });
        }

        let raw: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => {
                let reason = status
                    .canonical_reason()
                    .unwrap_or("An unexpected error occurred");
                return Ok(DecodedResponse {
                    status,
                    body: json!({ "message": reason }),
                    decrypted: false,
                });
            }
        };
        if !(mode.is_enabled() && Envelope::looks_like_envelope(&raw)) {
            return Ok(DecodedResponse { status, body: raw, decrypted: false });
        }
        let opened =
            Envelope::from_value(&raw).and_then(|env| self.codec.decrypt(&env, expected));
        match opened {
            Ok(body) => Ok(DecodedResponse { status, body, decrypted: true }),
            Err(err) => {
                warn!(
                    %status,
                    path,
                    error = %err,
                    "could not open encrypted error body; exposing raw body"
                );
                Ok(DecodedResponse { status, body: raw, decrypted: false })
            }
        }
    }
}
