use super::client::HttpClient;
use async_trait::async_trait;
use std::time::Duration;

/// Plain `reqwest` client with connect and overall timeouts.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// Fails if the TLS backend cannot be initialised.
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        let client = BasicClient::new().unwrap();
        let req = reqwest::Client::new()
            .get("http://127.0.0.1:9/source.csv")
            .build()
            .unwrap();

        let err = client.execute(req).await.unwrap_err();

        assert!(err.is_connect() || err.is_request());
    }
}
