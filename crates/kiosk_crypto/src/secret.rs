//! Shared secret handle.
//!
//! Exactly one of these exists per running client. It is handed to the
//! envelope codec at construction and never leaves process memory: `Debug`
//! is redacted and the bytes are wiped on drop.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wrap raw secret bytes. Empty secrets are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CryptoError::InvalidSecret("secret must not be empty".into()));
        }
        Ok(Self(bytes))
    }

    /// UTF-8 secret as provisioned through the environment.
    pub fn from_utf8(secret: &str) -> Result<Self, CryptoError> {
        Self::new(secret.as_bytes())
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}
