use std::time::Duration;

use kiosk_crypto::SharedSecret;
use kiosk_proto::EncryptionMode;
use thiserror::Error;

use crate::adapter::ResponseAadPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Client-side settings. The secret is held here and handed to the codec;
/// `Debug` never prints it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub secret: SharedSecret,
    /// Session-wide default; individual calls may override it.
    pub encryption: EncryptionMode,
    pub response_aad: ResponseAadPolicy,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, secret: SharedSecret) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            secret,
            encryption: EncryptionMode::Enabled,
            response_aad: ResponseAadPolicy::RequestPath,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("kiosk-transport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Read `KIOSK_API_URL`, `KIOSK_MASTER_SECRET`, `KIOSK_DATA_MODE`,
    /// `KIOSK_RESPONSE_AAD` and `KIOSK_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url =
            lookup("KIOSK_API_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let raw_secret =
            lookup("KIOSK_MASTER_SECRET").ok_or(ConfigError::Missing("KIOSK_MASTER_SECRET"))?;
        let secret = SharedSecret::from_utf8(&raw_secret).map_err(|e| ConfigError::Invalid {
            var: "KIOSK_MASTER_SECRET",
            reason: e.to_string(),
        })?;

        let mut config = Self::new(api_base_url, secret);
        config.encryption = EncryptionMode::from(
            lookup("KIOSK_DATA_MODE").is_some_and(|m| m.eq_ignore_ascii_case("REAL")),
        );
        config.response_aad = match lookup("KIOSK_RESPONSE_AAD").as_deref() {
            None | Some("path") => ResponseAadPolicy::RequestPath,
            Some("any") => ResponseAadPolicy::Any,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "KIOSK_RESPONSE_AAD",
                    reason: format!("expected `path` or `any`, got `{other}`"),
                })
            }
        };
        if let Some(secs) = lookup("KIOSK_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "KIOSK_HTTP_TIMEOUT_SECS",
                reason: e.to_string(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
