use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Implemented by [`super::BasicClient`] and by
/// wrappers that decorate requests before sending them.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
