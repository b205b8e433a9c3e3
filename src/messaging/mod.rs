pub mod audit;
pub mod broker;
pub mod event;
pub mod publisher;
#[cfg(test)]
pub(crate) mod testing;

pub use audit::AuditLogger;
pub use broker::{AmqpConnector, BrokerChannel, BrokerConnection, BrokerConnector, BrokerSession, ChannelProvider};
pub use event::{AuditEvent, FramerMessage, LogLevel};
pub use publisher::{FramerPublisher, PublishReport};
