pub mod api;
pub mod config;
pub mod error;
pub mod messaging;
pub mod models;
pub mod services;
pub mod validation;

// Re-export main components for easier use
pub use error::Error;
pub use messaging::{AuditLogger, BrokerConnection, ChannelProvider, FramerMessage, FramerPublisher};
pub use models::CameraGroup;
pub use services::CameraIngestService;
