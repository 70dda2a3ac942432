//! Claim-check operator tool.
//!
//! Usage:
//!   claimcheck send <FILE>                - Run a file through the send hook
//!   claimcheck receive <BLOB> <OUT>       - Restore an offloaded body into OUT
//!   claimcheck inspect <BLOB>             - Show the metadata of an offloaded body
//!   claimcheck roundtrip <FILE>           - Send then receive, and compare
//!
//! Storage and attachment settings come from `config/` and `CLAIMCHECK__*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claimcheck_core::attachment::{AttachmentMetadata, IncomingHook, OutgoingHook};
use claimcheck_core::storage::BlobRef;
use claimcheck_core::{AttachmentConfig, BlobStore, ClaimCheck, Clock, Message, SystemClock};
use claimcheck_shared::AppConfig;

/// Offload and restore message bodies through blob storage.
#[derive(Parser, Debug)]
#[command(name = "claimcheck", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a file through the send hook and print the resulting envelope.
    Send {
        /// File holding the message body.
        file: PathBuf,
        /// Message id recorded on the blob.
        #[arg(long)]
        message_id: Option<String>,
        /// Time to live in seconds; omit for no expiry.
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Restore an offloaded body into a file.
    Receive {
        /// Blob name from the reference property.
        blob: String,
        /// Destination file.
        out: PathBuf,
    },
    /// Print the metadata stored with an offloaded body.
    Inspect {
        /// Blob name from the reference property.
        blob: String,
    },
    /// Send then receive a file and check the body survives.
    Roundtrip {
        /// File holding the message body.
        file: PathBuf,
        /// Time to live in seconds; omit for no expiry.
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claimcheck_core=info,claimcheck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        provider = config.storage.name(),
        container = %config.attachment.container_name,
        threshold_bytes = config.attachment.threshold_bytes,
        "claim-check configured"
    );

    let claim_check =
        ClaimCheck::from_config(AttachmentConfig::from_settings(config.storage, &config.attachment))?;

    match args.command {
        Command::Send {
            file,
            message_id,
            ttl_secs,
        } => {
            let mut message = read_message(&file, ttl_secs).await?;
            message.message_id = message_id;
            claim_check.writer().before_send(&mut message).await?;
            print_envelope(&claim_check, &message);
        }
        Command::Receive { blob, out } => {
            let mut message = reference_message(&claim_check, blob);
            claim_check.reader().after_receive(&mut message).await?;
            tokio::fs::write(&out, &message.body)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(out = %out.display(), body_len = message.body.len(), "body restored");
        }
        Command::Inspect { blob } => inspect(&claim_check, blob).await?,
        Command::Roundtrip { file, ttl_secs } => {
            let message = read_message(&file, ttl_secs).await?;
            let original = message.body.clone();
            let restored =
                roundtrip(&claim_check.writer(), &claim_check.reader(), message).await?;
            if restored.body != original {
                bail!("restored body differs from {}", file.display());
            }
            print_envelope(&claim_check, &restored);
        }
    }

    Ok(())
}

async fn read_message(file: &Path, ttl_secs: Option<u64>) -> anyhow::Result<Message> {
    let body = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut message = Message::new(body);
    if let Some(secs) = ttl_secs {
        message = message.with_time_to_live(Duration::from_secs(secs));
    }
    Ok(message)
}

fn reference_message<S>(claim_check: &ClaimCheck<S>, blob: String) -> Message
where
    S: BlobStore,
{
    Message::default().with_property(claim_check.config().reference_property_name(), blob)
}

async fn roundtrip<W, R>(writer: &W, reader: &R, mut message: Message) -> anyhow::Result<Message>
where
    W: OutgoingHook,
    R: IncomingHook,
{
    writer.before_send(&mut message).await?;
    reader.after_receive(&mut message).await?;
    Ok(message)
}

async fn inspect<S: BlobStore>(claim_check: &ClaimCheck<S>, blob: String) -> anyhow::Result<()> {
    let blob = BlobRef::new(claim_check.config().container_name(), blob);
    let attributes = claim_check.store()?.fetch_attributes(&blob).await?;
    let metadata = AttachmentMetadata::from_attributes(&blob, &attributes)?;

    let output = json!({
        "blob": blob.path(),
        "length": attributes.length,
        "message_id": metadata.message_id,
        "valid_until": metadata.valid_until.map(|at| at.to_rfc3339()),
        "expired": metadata.is_expired_at(SystemClock.now()),
    });
    println!("{output:#}");
    Ok(())
}

fn print_envelope<S: BlobStore>(claim_check: &ClaimCheck<S>, message: &Message) {
    let property = claim_check.config().reference_property_name();
    let output = json!({
        "body_len": message.body.len(),
        "message_id": message.message_id,
        "reference": message.property_str(property),
        "properties": message.user_properties,
    });
    println!("{output:#}");
}
