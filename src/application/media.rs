// Snapshot rendering and image hosting seams
use crate::domain::error::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Request the rendered map; any non-success status is a `SnapshotError`.
    async fn fetch_snapshot(&self, url: &str) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Re-host the image behind `url` and return its public link.
    async fn upload_url(&self, url: &str) -> Result<String, PipelineError>;
}
