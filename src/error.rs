//! Error kinds surfaced by the aggregation job.
//!
//! Every variant is fatal to an invocation; nothing is retried.

use thiserror::Error;

use crate::aggregate::{AggFn, BaseField};

pub type Result<T> = std::result::Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    /// The source could not be fetched or its CSV content could not be parsed.
    #[error("failed to load {source_url}: {reason}")]
    Fetch { source_url: String, reason: String },

    /// A required column is absent from the header row.
    #[error("column '{column}' is missing from the source header")]
    MissingColumn { column: String },

    /// A cell could not be cast to its declared type.
    #[error("row {row}, column '{column}': cannot cast {value:?} to {target}: {reason}")]
    Schema {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
        reason: String,
    },

    /// An aggregate was requested that the job does not compute.
    #[error("unsupported aggregation {func:?} of {field:?}")]
    UnsupportedAggregation { field: BaseField, func: AggFn },

    /// Arrow or Parquet serialization failed.
    #[error("failed to encode output: {0}")]
    Encode(String),

    /// Writing the output to its destination failed.
    #[error("failed to write {destination}: {cause}")]
    Upload { destination: String, cause: String },
}

impl JobError {
    pub fn fetch(source_url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            source_url: source_url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn upload(destination: impl Into<String>, cause: impl ToString) -> Self {
        Self::Upload {
            destination: destination.into(),
            cause: cause.to_string(),
        }
    }

    pub fn encode(reason: impl ToString) -> Self {
        Self::Encode(reason.to_string())
    }

    /// True for failures caused by source content not matching the schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::MissingColumn { .. })
    }
}

impl From<arrow::error::ArrowError> for JobError {
    fn from(e: arrow::error::ArrowError) -> Self {
        Self::encode(e)
    }
}

impl From<parquet::errors::ParquetError> for JobError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Self::encode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_message_names_destination_and_cause() {
        let err = JobError::upload("s3://etl_bucket/target_files/out.parquet", "access denied");
        let msg = err.to_string();
        assert!(msg.contains("s3://etl_bucket/target_files/out.parquet"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn schema_classification() {
        let missing = JobError::MissingColumn {
            column: "dp".into(),
        };
        assert!(missing.is_schema_error());
        assert!(!JobError::fetch("x", "timeout").is_schema_error());
    }
}
