//! kiosk_crypto — cryptographic primitives for the kiosk secure channel
//!
//! # Design principles
//! - NO custom crypto; HKDF and AES-GCM come from audited RustCrypto crates.
//! - Zeroize all secret material on drop.
//! - The shared secret is an explicit, owned handle. There is no global.
//!
//! # Module layout
//! - `secret` — process-wide shared secret handle (redacted, zeroized)
//! - `kdf`    — HKDF-SHA256 per-message key derivation
//! - `aead`   — AES-256-GCM seal/open helpers
//! - `error`  — unified error type

pub mod aead;
pub mod error;
pub mod kdf;
pub mod secret;

pub use error::CryptoError;
pub use kdf::{derive, DerivedKey, IV_LEN, KDF_INFO, KEY_LEN, SALT_LEN};
pub use secret::SharedSecret;
