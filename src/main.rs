//! Entry point for the dp aggregation job.
//!
//! One process run is one invocation: load the source CSV, aggregate it by
//! `dp`, write the Parquet result and exit. A non-zero exit reports failure
//! to the invoking platform.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use dp_aggregator::config::{
    DEFAULT_BUCKET, DEFAULT_FILENAME, DEFAULT_PREFIX, DEFAULT_PREVIEW_ROWS, DEFAULT_SOURCE_URL,
};
use dp_aggregator::fetch::BasicClient;
use dp_aggregator::storage::RoutingStore;
use dp_aggregator::{AggregationJob, InvocationContext, JobConfig, handler};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "dp_aggregator")]
#[command(about = "Aggregate the source CSV by dp and write it as Parquet", long_about = None)]
struct Cli {
    /// CSV source URL or local path
    #[arg(long, env = "DP_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Destination S3 bucket
    #[arg(long, env = "DP_BUCKET", default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Key prefix inside the bucket
    #[arg(long, env = "DP_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Output file name
    #[arg(long, env = "DP_FILENAME", default_value = DEFAULT_FILENAME)]
    filename: String,

    /// Number of output rows to log after writing
    #[arg(long, env = "DP_PREVIEW_ROWS", default_value_t = DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,

    /// Write to this URI or local path instead of the S3 destination
    #[arg(long, env = "DP_DESTINATION")]
    destination: Option<String>,

    /// JSON file holding the invocation event ("-" reads stdin)
    #[arg(long, value_name = "PATH")]
    event: Option<String>,

    /// Request id reported by the platform
    #[arg(long, env = "DP_REQUEST_ID")]
    request_id: Option<String>,
}

impl Cli {
    fn config(&self) -> JobConfig {
        JobConfig {
            source_url: self.source_url.clone(),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            filename: self.filename.clone(),
            preview_rows: self.preview_rows,
            destination_override: self.destination.clone(),
        }
    }
}

/// Reads the invocation event from `source`: a file path, `-` for stdin, or
/// nothing for a `null` event.
async fn read_event(source: Option<&str>) -> Result<serde_json::Value> {
    let raw = match source {
        None => return Ok(serde_json::Value::Null),
        Some("-") => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading event file {path}"))?,
    };
    serde_json::from_str(&raw).context("event payload is not valid JSON")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = logging::init()?;

    let cli = Cli::parse();
    let event = read_event(cli.event.as_deref()).await?;
    let context = cli
        .request_id
        .as_deref()
        .map(InvocationContext::new)
        .unwrap_or_else(InvocationContext::local);

    let config = cli.config();
    info!(
        source = %config.source_url,
        destination = %config.destination(),
        "Starting aggregation job"
    );

    let job = AggregationJob::new(config, BasicClient::new()?, RoutingStore::new());

    if let Err(e) = handler(&job, event, context).await {
        error!(error = %e, "Aggregation job failed");
        return Err(e.into());
    }

    Ok(())
}
