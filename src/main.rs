// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dispatcher::Dispatcher;
use crate::application::location_extractor::PatternExtractor;
use crate::application::route_provider::RouteProvider;
use crate::application::summary_service::SummaryService;
use crate::infrastructure::config::{ProviderKind, load_app_config};
use crate::infrastructure::credentials::MapKitCredentials;
use crate::infrastructure::discord_webhook::DiscordWebhook;
use crate::infrastructure::imgur::ImgurHost;
use crate::infrastructure::maps_server::MapsServerProvider;
use crate::infrastructure::sandbox::{NodeScriptHost, SandboxProvider};
use crate::infrastructure::snapshot_client::HttpSnapshotFetcher;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, receive_message};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("magellan=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Credentials are read once and shared read-only by every request
    let key_path = config.mapkit.private_key_path();
    let credentials = Arc::new(
        MapKitCredentials::from_key_file(
            config.mapkit.team_id.clone(),
            config.mapkit.key_id.clone(),
            &config.mapkit.domain,
            &key_path,
        )
        .with_context(|| format!("Failed to load MapKit key {}", key_path.display()))?,
    );

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    // Adapters (infrastructure layer)
    let routes: Arc<dyn RouteProvider> = match config.mapkit.provider {
        ProviderKind::Server => Arc::new(MapsServerProvider::new(
            http.clone(),
            credentials.clone(),
            &config.mapkit.maps_api_url,
        )),
        ProviderKind::Sandbox => Arc::new(SandboxProvider::new(
            NodeScriptHost::new(config.mapkit.node_binary.clone()),
            credentials.clone(),
        )),
    };
    let snapshots = Arc::new(HttpSnapshotFetcher::new(http.clone()));
    let images = Arc::new(ImgurHost::new(
        http.clone(),
        config.imgur.client_id.clone(),
        config.imgur.album.clone(),
    ));
    let channel = Arc::new(DiscordWebhook::new(http, &config.discord.webhook_url));

    // Use cases (application layer)
    let summaries = SummaryService::new(
        credentials,
        config.mapkit.snapshot_host.clone(),
        snapshots,
        images,
    );
    let dispatcher = Dispatcher::new(
        Arc::new(PatternExtractor),
        routes,
        summaries,
        channel,
        config.mapkit.route_timeout(),
    );

    let state = Arc::new(AppState { dispatcher });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/messages", post(receive_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!(
        "Starting magellan on {} ({:?} directions provider)",
        addr,
        config.mapkit.provider
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
