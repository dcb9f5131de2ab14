// Dispatcher - One pipeline per inbound directions request
use crate::application::chat_channel::{ChatChannel, MessageHandle};
use crate::application::location_extractor::LocationExtractor;
use crate::application::route_provider::RouteProvider;
use crate::application::summary_service::SummaryService;
use crate::domain::error::PipelineError;
use crate::domain::payload::DisplayPayload;
use crate::domain::route::DirectionRequest;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// A chat message relayed to the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub author: String,
    pub content: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    extractor: Arc<dyn LocationExtractor>,
    routes: Arc<dyn RouteProvider>,
    summaries: SummaryService,
    channel: Arc<dyn ChatChannel>,
    route_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        extractor: Arc<dyn LocationExtractor>,
        routes: Arc<dyn RouteProvider>,
        summaries: SummaryService,
        channel: Arc<dyn ChatChannel>,
        route_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            routes,
            summaries,
            channel,
            route_timeout,
        }
    }

    pub fn on_directions_request(&self, text: &str) -> Option<DirectionRequest> {
        self.extractor.extract_locations(text)
    }

    /// Run the pipeline for `message` in the background. Returns `false` when
    /// the message is not a directions request.
    pub fn dispatch(&self, message: InboundMessage) -> bool {
        let Some(request) = self.on_directions_request(&message.content) else {
            return false;
        };

        tracing::info!(
            "Directions requested by {}: {} -> {}",
            message.author,
            request.origin,
            request.destination
        );
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.handle(request).await });
        true
    }

    /// Post the placeholder, run the pipeline and edit the reply with the result.
    pub async fn handle(&self, request: DirectionRequest) -> DisplayPayload {
        let mut payload = DisplayPayload::placeholder(&request.origin, &request.destination);

        let reply = match self.channel.post(&payload).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to post placeholder reply: {:#}", e);
                None
            }
        };

        if let Err(e) = self.run_pipeline(&mut payload, &request).await {
            let message = e.user_message();
            if e.is_fatal() {
                tracing::error!("Request aborted: {}", message);
            } else {
                tracing::warn!("Request failed: {}", message);
            }
            payload.set_error(&message);
        }

        self.deliver(reply.as_ref(), &payload).await;
        payload
    }

    async fn run_pipeline(
        &self,
        payload: &mut DisplayPayload,
        request: &DirectionRequest,
    ) -> Result<(), PipelineError> {
        let route = tokio::time::timeout(
            self.route_timeout,
            self.routes.fetch_route(&request.origin, &request.destination),
        )
        .await
        .map_err(|_| {
            PipelineError::ProviderError(format!(
                "timed out after {} seconds waiting for directions",
                self.route_timeout.as_secs()
            ))
        })??;

        self.summaries.build_summary(payload, request, &route).await
    }

    async fn deliver(&self, reply: Option<&MessageHandle>, payload: &DisplayPayload) {
        let Some(handle) = reply else {
            return;
        };
        if let Err(e) = self.channel.edit(handle, payload).await {
            tracing::warn!("Reply {} is no longer editable: {:#}", handle.id, e);
        }
    }
}
