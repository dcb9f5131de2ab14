// Outbound chat seam - post a reply and edit it later
use crate::domain::payload::DisplayPayload;
use async_trait::async_trait;

/// Identifies a previously posted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: String,
}

#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn post(&self, payload: &DisplayPayload) -> anyhow::Result<MessageHandle>;

    async fn edit(&self, handle: &MessageHandle, payload: &DisplayPayload) -> anyhow::Result<()>;
}
