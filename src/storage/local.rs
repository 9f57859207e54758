use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::debug;

use super::{Location, ObjectStore};

/// Writes objects to the local filesystem, creating parent directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

#[async_trait::async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, location: &Location, body: Bytes) -> Result<()> {
        let Location::Local(path) = location else {
            anyhow::bail!("local store cannot write {location}");
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        tokio::fs::write(path, &body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        debug!(path = %path.display(), bytes = body.len(), "Local object written");
        Ok(())
    }
}
