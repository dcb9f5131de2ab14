// Presentation layer - HTTP surface for relayed chat messages
pub mod app_state;
pub mod handlers;
