//! Backend-side encryption filter.
//!
//! Mirrors the adapter for whoever serves the API: requests negotiated with
//! `X-Encryption-Mode: TRUE` arrive as envelopes bound to the request path,
//! and their responses go back sealed to that same path.

use kiosk_proto::{CodecError, EncryptionMode, Envelope, EnvelopeCodec};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct EncryptionFilter {
    codec: EnvelopeCodec,
}

impl EncryptionFilter {
    pub fn new(codec: EnvelopeCodec) -> Self {
        Self { codec }
    }

    pub fn is_encrypted(header_value: Option<&str>) -> bool {
        EncryptionMode::from_header_value(header_value).is_enabled()
    }

    /// Decrypt an incoming body. Empty bodies (GET, DELETE) yield `None`.
    pub fn open_request(&self, path: &str, body: &[u8]) -> Result<Option<Value>, CodecError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let envelope = Envelope::from_slice(body)?;
        let payload = self.codec.decrypt(&envelope, Some(path))?;
        debug!(path, "opened encrypted request body");
        Ok(Some(payload))
    }

    /// Seal a response payload to the request path.
    pub fn seal_response<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Envelope, CodecError> {
        self.codec.encrypt(payload, path)
    }

    /// Plain 400 body sent when the secure channel itself fails.
    pub fn error_response(&self, err: &CodecError) -> (u16, Value) {
        error!(error = %err, "secure channel error");
        (
            400,
            json!({
                "success": false,
                "message": format!("Secure Channel Error: {err}"),
            }),
        )
    }
}
