// Application layer - Use cases and the seams they depend on
pub mod chat_channel;
pub mod dispatcher;
pub mod location_extractor;
pub mod media;
pub mod route_provider;
pub mod summary_service;
