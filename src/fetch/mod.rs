//! HTTP retrieval of the source dataset.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use tracing::debug;

/// Issues a GET for `url` through `client` and returns the response body.
///
/// Non-success statuses are errors; the body of such a response is discarded.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Source body received");

    Ok(bytes.to_vec())
}
