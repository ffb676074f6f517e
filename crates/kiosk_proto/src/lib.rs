//! kiosk_proto — wire envelope and codec for the kiosk secure channel
//!
//! Every encrypted request or response body is a four-field JSON object:
//! `iv`, `salt`, `ciphertext` (all base64) and `aad` (the API path, plain).
//!
//! # Modules
//! - `envelope`    — the immutable wire record and its strict parser
//! - `codec`       — encrypt/decrypt JSON payloads into/from envelopes
//! - `negotiation` — the `X-Encryption-Mode` header and mode flag
//! - `error`       — codec error taxonomy

pub mod codec;
pub mod envelope;
pub mod error;
pub mod negotiation;

pub use codec::EnvelopeCodec;
pub use envelope::Envelope;
pub use error::CodecError;
pub use negotiation::{EncryptionMode, ENCRYPTION_HEADER, ENCRYPTION_HEADER_VALUE};
