use std::sync::Arc;

use kiosk_proto::{EncryptionMode, EnvelopeCodec, ENCRYPTION_HEADER};
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::SecureTransport;
use crate::config::ClientConfig;
use crate::error::ApiError;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Per-call knobs.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides the session encryption mode for this call only.
    pub encryption: Option<EncryptionMode>,
    pub idempotency_key: Option<String>,
}

impl RequestOptions {
    pub fn with_encryption(mut self, mode: EncryptionMode) -> Self {
        self.encryption = Some(mode);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_fresh_idempotency_key(self) -> Self {
        self.with_idempotency_key(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    transport: SecureTransport,
    encryption: EncryptionMode,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        let codec = EnvelopeCodec::new(config.secret.clone());
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            transport: SecureTransport::new(codec, config.response_aad),
            encryption: config.encryption,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn encryption(&self) -> EncryptionMode {
        self.encryption
    }

    /// `base_url` + `endpoint`. The URL path doubles as the envelope AAD.
    pub fn url_for(&self, endpoint: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, None, RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::InvalidBody)?;
        self.request(Method::POST, endpoint, Some(&body), RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::InvalidBody)?;
        self.request(Method::PUT, endpoint, Some(&body), RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, endpoint, None, RequestOptions::default())
            .await
    }

    /// Send one request. Crypto failures are returned as-is and the network
    /// call is never retried.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url_for(endpoint)?;
        let path = url.path().to_owned();
        let mode = options.encryption.unwrap_or(self.encryption);
        let outgoing = self.transport.seal_request(mode, &path, body)?;

        let mut req = self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        if let Some(key) = options.idempotency_key {
            req = req.header(IDEMPOTENCY_HEADER, key);
        }
        if let Some(value) = outgoing.encryption_header {
            req = req.header(ENCRYPTION_HEADER, value);
        }
        if let Some(bytes) = outgoing.body {
            req = req.body(bytes);
        }

        debug!(%method, path = %path, encrypted = mode.is_enabled(), "sending api request");
        let res = req.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.clear_token();
            warn!(%status, path = %path, "unauthorized; cleared bearer token");
        }

        let decoded = self.transport.open_response(mode, &path, status, &bytes)?;
        if !status.is_success() {
            debug!(%status, path = %path, decrypted = decoded.decrypted, "api request failed");
            return Err(ApiError::Status { status, body: decoded.body });
        }
        serde_json::from_value(decoded.body).map_err(ApiError::InvalidBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_crypto::SharedSecret;

    fn client(base: &str) -> ApiClient {
        let secret = SharedSecret::from_utf8("TEST_MASTER_SECRET_1234567890_CHANGE_ME").unwrap();
        ApiClient::new(&ClientConfig::new(base, secret)).unwrap()
    }

    #[test]
    fn aad_path_includes_base_path() {
        let c = client("http://localhost:8080/v1/");
        assert_eq!(c.url_for("/auth/login").unwrap().path(), "/v1/auth/login");
        assert_eq!(c.url_for("/health").unwrap().path(), "/v1/health");
    }

    #[test]
    fn invalid_base_url_reported() {
        let c = client("not a url");
        assert!(matches!(c.url_for("/health"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn token_lifecycle() {
        let c = client("http://localhost:8080/v1");
        assert_eq!(c.token(), None);
        c.set_token("jwt");
        assert_eq!(c.clone().token().as_deref(), Some("jwt"));
        c.clear_token();
        assert_eq!(c.token(), None);
    }

    #[test]
    fn request_options_builders() {
        let opts = RequestOptions::default()
            .with_encryption(EncryptionMode::Disabled)
            .with_fresh_idempotency_key();
        assert_eq!(opts.encryption, Some(EncryptionMode::Disabled));
        assert_eq!(opts.idempotency_key.map(|k| k.len()), Some(36));
    }
}
