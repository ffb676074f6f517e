//! Encrypted message envelope — what crosses the wire.
//!
//! ```json
//! { "iv": "<b64, 12 bytes>", "salt": "<b64, 16 bytes>",
//!   "ciphertext": "<b64, len + 16>", "aad": "/v1/auth/login" }
//! ```
//!
//! An envelope is never mutated. It is produced by `EnvelopeCodec::encrypt`
//! or parsed from a received body, then consumed by `EnvelopeCodec::decrypt`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use kiosk_crypto::aead::TAG_LEN;
use kiosk_crypto::{IV_LEN, SALT_LEN};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub(crate) iv: String,
    pub(crate) salt: String,
    pub(crate) ciphertext: String,
    pub(crate) aad: String,
}

/// Raw bytes recovered from the base64 fields.
pub(crate) struct DecodedParts {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn iv(&self) -> &str {
        &self.iv
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// The API path this envelope is bound to. Authenticated, not encrypted.
    pub fn aad(&self) -> &str {
        &self.aad
    }

    /// Duck-typed check used on error responses: any JSON object carrying a
    /// `ciphertext` field is treated as a candidate envelope.
    pub fn looks_like_envelope(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.contains_key("ciphertext"))
    }

    /// Parse a wire body. Every field must be present and a string.
    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        Self::deserialize(value).map_err(malformed)
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(body).map_err(malformed)
    }

    pub fn from_json(body: &str) -> Result<Self, CodecError> {
        serde_json::from_str(body).map_err(malformed)
    }

    pub fn to_value(&self) -> Result<Value, CodecError> {
        serde_json::to_value(self).map_err(CodecError::Serialisation)
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Serialisation)
    }

    /// Base64-decode and length-check salt, iv and ciphertext.
    pub(crate) fn decode_parts(&self) -> Result<DecodedParts, CodecError> {
        let salt = decode_fixed::<SALT_LEN>("salt", &self.salt)?;
        let iv = decode_fixed::<IV_LEN>("iv", &self.iv)?;
        let ciphertext = decode_b64("ciphertext", &self.ciphertext)?;
        if ciphertext.len() < TAG_LEN {
            return Err(CodecError::MalformedEnvelope(format!(
                "ciphertext must be at least {TAG_LEN} bytes, got {}",
                ciphertext.len()
            )));
        }
        Ok(DecodedParts { salt, iv, ciphertext })
    }
}

fn malformed(err: serde_json::Error) -> CodecError {
    CodecError::MalformedEnvelope(err.to_string())
}

fn decode_b64(name: &str, encoded: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| {
            CodecError::MalformedEnvelope(format!("field `{name}` is not base64: {e}"))
        })
}

fn decode_fixed<const N: usize>(name: &str, encoded: &str) -> Result<[u8; N], CodecError> {
    let bytes = decode_b64(name, encoded)?;
    bytes.try_into().map_err(|raw: Vec<u8>| {
        CodecError::MalformedEnvelope(format!(
            "field `{name}` must decode to {N} bytes, got {}",
            raw.len()
        ))
    })
}
