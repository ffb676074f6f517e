//! Encryption negotiation.
//!
//! A request carrying `X-Encryption-Mode: TRUE` has an envelope body and asks
//! for an envelope back. Without the header, bodies are plain JSON.

use serde::{Deserialize, Serialize};

pub const ENCRYPTION_HEADER: &str = "X-Encryption-Mode";
pub const ENCRYPTION_HEADER_VALUE: &str = "TRUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    #[default]
    Disabled,
    Enabled,
}

impl EncryptionMode {
    /// Interpret a received header value. `None` means the header was absent.
    pub fn from_header_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case(ENCRYPTION_HEADER_VALUE) => Self::Enabled,
            _ => Self::Disabled,
        }
    }

    /// Header value to send, if any.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Enabled => Some(ENCRYPTION_HEADER_VALUE),
            Self::Disabled => None,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

impl From<bool> for EncryptionMode {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}
