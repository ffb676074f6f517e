//! Authenticated Encryption with Associated Data
//!
//! Uses AES-256-GCM (96-bit nonce, 128-bit tag).
//! The tag is appended to the ciphertext, matching the WebCrypto and JCE
//! `AES/GCM/NoPadding` output the other end of the channel produces.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::{DerivedKey, IV_LEN};

pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and `iv`. Returns ciphertext || tag.
/// `aad` — additional associated data (authenticated but not encrypted).
pub fn seal(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AeadEncrypt)?;
    cipher
        .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)
}

/// Decrypt ciphertext || tag. Any tag mismatch is `CryptoError::Authentication`.
pub fn open(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Authentication);
    }
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Authentication)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}
