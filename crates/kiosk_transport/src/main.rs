use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use kiosk_proto::{EncryptionMode, Envelope, EnvelopeCodec};
use kiosk_transport::{ApiClient, ApiError, ClientConfig, RequestOptions};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Kiosk secure channel probe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypted GET /health
    Health,
    /// Encrypted POST /auth/login
    Login {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        pin: String,
    },
    /// Print the envelope for a JSON payload
    Seal {
        #[arg(long)]
        path: String,
        payload: String,
    },
    /// Decrypt an envelope
    Open {
        /// Require the envelope to be bound to this path
        #[arg(long)]
        path: Option<String>,
        envelope: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiosk_transport=info,kiosk_probe=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    match cli.command {
        Commands::Health => health_command(&config).await,
        Commands::Login { user_id, pin } => login_command(&config, &user_id, &pin).await,
        Commands::Seal { path, payload } => seal_command(&config, &path, &payload),
        Commands::Open { path, envelope } => open_command(&config, path.as_deref(), &envelope),
    }
}

async fn health_command(config: &ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;
    let opts = RequestOptions::default().with_encryption(EncryptionMode::Enabled);
    let res: Result<Value, ApiError> = client.request(Method::GET, "/health", None, opts).await;
    report("health", res)
}

async fn login_command(config: &ClientConfig, user_id: &str, pin: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    let body = json!({ "userId": user_id, "pin": pin });
    let opts = RequestOptions::default()
        .with_encryption(EncryptionMode::Enabled)
        .with_fresh_idempotency_key();
    let res: Result<Value, ApiError> = client
        .request(Method::POST, "/auth/login", Some(&body), opts)
        .await;
    if let Ok(payload) = &res {
        if payload.get("token").is_some() || payload.pointer("/data/token").is_some() {
            info!("token received, auth flow valid");
        }
    }
    report("login", res)
}

fn seal_command(config: &ClientConfig, path: &str, payload: &str) -> Result<()> {
    let payload: Value = serde_json::from_str(payload).context("payload is not JSON")?;
    let envelope = EnvelopeCodec::new(config.secret.clone()).encrypt(&payload, path)?;
    println!("{}", envelope.to_json()?);
    Ok(())
}

fn open_command(config: &ClientConfig, path: Option<&str>, envelope: &str) -> Result<()> {
    let envelope = Envelope::from_json(envelope)?;
    let payload = EnvelopeCodec::new(config.secret.clone()).decrypt(&envelope, path)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn report(label: &str, res: Result<Value, ApiError>) -> Result<()> {
    match res {
        Ok(payload) => {
            info!(label, "decrypted response received");
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(ApiError::Status { status, body }) => {
            error!(label, %status, "request failed");
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(anyhow!("{label} failed with status {status}"))
        }
        Err(err) => {
            error!(label, code = %err.code(), error = %err, "request failed");
            Err(err.into())
        }
    }
}
