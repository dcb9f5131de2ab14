// Domain layer - Core business models
pub mod error;
pub mod geometry;
pub mod payload;
pub mod route;
pub mod snapshot;
