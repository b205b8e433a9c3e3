use crate::error::Error;
use crate::messaging::broker::ChannelProvider;
use crate::messaging::event::{AuditEvent, LogLevel};
use log::{error, info, warn};
use std::sync::Arc;

/// Writes operational events to the process log and the audit queue.
///
/// Queue delivery is best-effort: a failure is logged locally and the cached
/// connection is dropped so the next acquisition reconnects.
#[derive(Clone)]
pub struct AuditLogger {
    provider: Arc<dyn ChannelProvider>,
    queue: String,
}

impl AuditLogger {
    pub fn new(provider: Arc<dyn ChannelProvider>, queue: impl Into<String>) -> Self {
        Self {
            provider,
            queue: queue.into(),
        }
    }

    pub async fn log_info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message.into()).await;
    }

    pub async fn log_exception(&self, message: impl Into<String>) {
        self.record(LogLevel::Exception, message.into()).await;
    }

    async fn record(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{}", message),
            LogLevel::Exception => error!("{}", message),
        }

        let event = AuditEvent::new(level, message);
        if let Err(e) = self.send(&event).await {
            warn!("Failed to send log to RabbitMQ: {}", e);
            self.provider.invalidate().await;
        }
    }

    async fn send(&self, event: &AuditEvent) -> Result<(), Error> {
        let channel = self.provider.acquire_channel().await?;
        channel.declare_queue(&self.queue).await?;

        let body = serde_json::to_vec(event)?;
        // Default exchange routes by queue name.
        channel.publish("", &self.queue, &body).await
    }
}
