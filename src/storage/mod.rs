//! Destinations for the job output.
//!
//! [`Location`] is parsed from a destination URI. [`ObjectStore`] is the async
//! trait that writes bytes to a location. [`S3Store`] and [`LocalStore`]
//! implement it for S3 and the local filesystem, [`RoutingStore`] dispatches
//! between them, and [`MemoryStore`] keeps objects in memory.

mod local;
mod memory;
mod s3;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use anyhow::Result;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::OnceCell;

/// Where an object is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    S3 { bucket: String, key: String },
    Local(PathBuf),
}

impl Location {
    /// Parses `s3://bucket/key`, `file:///path` or a bare filesystem path.
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                anyhow::bail!("missing bucket in '{uri}'");
            }
            if key.is_empty() || key.ends_with('/') {
                anyhow::bail!("missing object key in '{uri}'");
            }
            return Ok(Location::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if path.is_empty() {
            anyhow::bail!("empty destination path");
        }
        Ok(Location::Local(PathBuf::from(path)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Writes a complete object, replacing whatever is already there.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, location: &Location, body: Bytes) -> Result<()>;
}

/// Sends S3 locations to an [`S3Store`] and local paths to a [`LocalStore`].
///
/// The S3 client is only configured the first time an S3 location is written.
#[derive(Default)]
pub struct RoutingStore {
    s3: OnceCell<S3Store>,
    local: LocalStore,
}

impl RoutingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for RoutingStore {
    async fn put(&self, location: &Location, body: Bytes) -> Result<()> {
        match location {
            Location::S3 { .. } => {
                let s3 = self.s3.get_or_init(S3Store::from_env).await;
                s3.put(location, body).await
            }
            Location::Local(_) => self.local.put(location, body).await,
        }
    }
}
