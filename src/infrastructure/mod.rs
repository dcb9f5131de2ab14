// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod credentials;
pub mod discord_webhook;
pub mod imgur;
pub mod maps_server;
pub mod request_signer;
pub mod sandbox;
pub mod snapshot_client;
