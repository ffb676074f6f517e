//! kiosk_transport — makes envelope encryption transparent to API callers.
//!
//! # Modules
//! - `adapter`    — stateless request/response transforms around the codec
//! - `api_client` — async `reqwest` client for the kiosk backend API
//! - `filter`     — backend-side counterpart: open requests, seal responses
//! - `config`     — environment-driven client configuration
//! - `error`      — transport error type

pub mod adapter;
pub mod api_client;
pub mod config;
pub mod error;
pub mod filter;

pub use adapter::{DecodedResponse, OutgoingRequest, ResponseAadPolicy, SecureTransport};
pub use api_client::{ApiClient, RequestOptions};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use filter::EncryptionFilter;
