//! Job configuration, resolved once at startup and injected into the job.

/// Named settings for one run. [`Default`] yields the production values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// CSV source: an `http(s)` URL or a local path.
    pub source_url: String,
    pub bucket: String,
    /// Key prefix inside the bucket, including its trailing `/`.
    pub prefix: String,
    pub filename: String,
    /// Rows shown in the post-write preview.
    pub preview_rows: usize,
    /// Overrides the S3 destination with an explicit URI (e.g. a local path).
    pub destination_override: Option<String>,
}

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/BetoAvila/datasets/main/random_datasets/ds_1.csv";
pub const DEFAULT_BUCKET: &str = "etl_bucket";
pub const DEFAULT_PREFIX: &str = "target_files/";
pub const DEFAULT_FILENAME: &str = "etl_output.parquet";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            destination_override: None,
        }
    }
}

impl JobConfig {
    /// Full destination URI of the output file.
    pub fn destination(&self) -> String {
        if let Some(dest) = &self.destination_override {
            return dest.clone();
        }
        format!("s3://{}/{}{}", self.bucket, self.prefix, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_destination() {
        assert_eq!(
            JobConfig::default().destination(),
            "s3://etl_bucket/target_files/etl_output.parquet"
        );
    }

    #[test]
    fn test_destination_override() {
        let config = JobConfig {
            destination_override: Some("out/local.parquet".into()),
            ..Default::default()
        };
        assert_eq!(config.destination(), "out/local.parquet");
    }
}
