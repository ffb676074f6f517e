//! Key derivation
//!
//! `derive` — HKDF-SHA256 over the shared secret and a per-message salt.
//!   A fresh key is derived for every message; nothing is cached.
//!
//! `hkdf_expand` — the underlying extract-then-expand step.

use std::fmt;

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;
use crate::secret::SharedSecret;

/// Protocol context label. Constant across all messages.
pub const KDF_INFO: &[u8] = b"kiosk-api";

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// 32-byte single-use AES-256 key. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the message key for `salt`.
///
/// Fails only when `salt` is not exactly 16 bytes or the secret is empty.
pub fn derive(secret: &SharedSecret, salt: &[u8], info: &[u8]) -> Result<DerivedKey, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::Derivation("shared secret is empty".into()));
    }
    if salt.len() != SALT_LEN {
        return Err(CryptoError::Derivation(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }
    let mut key = [0u8; KEY_LEN];
    hkdf_expand(secret.expose(), Some(salt), info, &mut key)?;
    Ok(DerivedKey(key))
}

/// Expand `ikm` + `info` into `output.len()` bytes of key material.
///
/// `salt` may be `None` (HKDF will use a zeroed salt).
pub fn hkdf_expand(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::Derivation(e.to_string()))
}

/// Fresh random 16-byte salt, one per message.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh random 12-byte GCM nonce, one per message.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}
