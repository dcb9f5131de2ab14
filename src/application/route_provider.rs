// Route provider trait for directions lookups
use crate::domain::error::PipelineError;
use crate::domain::route::RouteSummary;
use async_trait::async_trait;

#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// First automobile route between two free-text places.
    ///
    /// A single attempt with no internal timeout; callers bound the wait.
    async fn fetch_route(&self, origin: &str, destination: &str)
        -> Result<RouteSummary, PipelineError>;
}
