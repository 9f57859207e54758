//! The aggregation pipeline and its invocation entry point.

use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::aggregate::aggregate;
use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::fetch::HttpClient;
use crate::flatten::flatten;
use crate::output::{encode_parquet, preview};
use crate::schema::coerce;
use crate::source::load;
use crate::storage::{Location, ObjectStore};

/// Runtime metadata supplied by the invoking platform.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub request_id: String,
    pub invoked_at: DateTime<Utc>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            invoked_at: Utc::now(),
        }
    }

    /// Context for a run started outside the platform.
    pub fn local() -> Self {
        let now = Utc::now();
        Self {
            request_id: format!("local-{}", now.timestamp_millis()),
            invoked_at: now,
        }
    }
}

/// Load, coerce, aggregate, flatten and write, in that order.
pub struct AggregationJob<C, S> {
    config: JobConfig,
    client: C,
    store: S,
}

impl<C: HttpClient, S: ObjectStore> AggregationJob<C, S> {
    pub fn new(config: JobConfig, client: C, store: S) -> Self {
        Self {
            config,
            client,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the pipeline once and returns the table that was written.
    #[tracing::instrument(
        skip_all,
        fields(source = %self.config.source_url, destination = %self.config.destination())
    )]
    pub async fn run(&self) -> Result<RecordBatch> {
        let raw = load(&self.client, &self.config.source_url).await?;
        let records = coerce(&raw)?;
        let batch = flatten(aggregate(&records)?)?;

        write(&self.store, &batch, &self.config.destination()).await?;

        info!(
            "Aggregated output:\n{}",
            preview(&batch, self.config.preview_rows)?
        );
        Ok(batch)
    }
}

/// Encodes `batch` as Parquet and stores it at `destination`, replacing any
/// existing object.
///
/// Storage failures are logged with the destination and cause, then returned
/// as [`JobError::Upload`].
pub async fn write<S: ObjectStore + ?Sized>(
    store: &S,
    batch: &RecordBatch,
    destination: &str,
) -> Result<()> {
    let body = encode_parquet(batch)?;
    let size = body.len();

    let stored = match Location::parse(destination) {
        Ok(location) => store.put(&location, body).await,
        Err(e) => Err(e),
    };

    if let Err(e) = stored {
        let cause = format!("{e:#}");
        error!(destination, error = %cause, "Error on bucket data load");
        return Err(JobError::upload(destination, cause));
    }

    info!(destination, rows = batch.num_rows(), bytes = size, "Output written");
    Ok(())
}

/// Platform entry point. The event payload and context are accepted but do
/// not influence the run.
#[tracing::instrument(skip_all, fields(request_id = %context.request_id))]
pub async fn handler<C: HttpClient, S: ObjectStore>(
    job: &AggregationJob<C, S>,
    _event: serde_json::Value,
    context: InvocationContext,
) -> Result<()> {
    info!(invoked_at = %context.invoked_at, "Invocation started");
    let batch = job.run().await?;
    info!(groups = batch.num_rows(), "Invocation finished");
    Ok(())
}
