// HTTP snapshot fetcher
use crate::application::media::SnapshotFetcher;
use crate::domain::error::PipelineError;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct HttpSnapshotFetcher {
    client: reqwest::Client,
}

impl HttpSnapshotFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch_snapshot(&self, url: &str) -> Result<(), PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::SnapshotError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Snapshot request failed with status {}: {}", status, body);
            return Err(PipelineError::SnapshotError(status.to_string()));
        }

        tracing::debug!("Snapshot rendered ({})", status);
        Ok(())
    }
}
