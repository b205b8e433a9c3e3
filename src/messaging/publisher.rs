use crate::error::Error;
use crate::messaging::audit::AuditLogger;
use crate::messaging::broker::{BrokerChannel, ChannelProvider};
use crate::messaging::event::FramerMessage;
use crate::models::CameraGroup;
use log::debug;
use std::sync::Arc;

/// Outcome of a batch that reached the broker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
}

/// Publishes validated camera groups to the framer fanout exchange
#[derive(Clone)]
pub struct FramerPublisher {
    provider: Arc<dyn ChannelProvider>,
    audit: AuditLogger,
    exchange: String,
}

impl FramerPublisher {
    pub fn new(provider: Arc<dyn ChannelProvider>, audit: AuditLogger, exchange: impl Into<String>) -> Self {
        Self {
            provider,
            audit,
            exchange: exchange.into(),
        }
    }

    /// Publish every group of a batch.
    ///
    /// Only channel acquisition and exchange declaration abort the batch, with
    /// `Error::BrokerUnavailable`. A failed publish is audited and skipped.
    pub async fn publish_batch(&self, groups: &[CameraGroup]) -> Result<PublishReport, Error> {
        let channel = self.provider.acquire_channel().await?;

        channel
            .declare_fanout_exchange(&self.exchange)
            .await
            .map_err(|e| Error::BrokerUnavailable(e.to_string()))?;

        let mut report = PublishReport::default();
        for group in groups {
            match self.publish_group(channel.as_ref(), group).await {
                Ok(()) => {
                    report.published += 1;
                    self.audit
                        .log_info(format!(
                            "Published camera {} URL {} to RabbitMQ.",
                            group.camera_ids_display(),
                            group.urls_display()
                        ))
                        .await;
                }
                Err(e) => {
                    report.failed += 1;
                    self.audit.log_exception(e.to_string()).await;
                }
            }
        }

        Ok(report)
    }

    async fn publish_group(&self, channel: &dyn BrokerChannel, group: &CameraGroup) -> Result<(), Error> {
        let failure = |cause: String| Error::PublishFailure {
            camera_ids: group.camera_ids_display(),
            cause,
        };

        let message = FramerMessage::from(group);
        let body = serde_json::to_vec(&message).map_err(|e| failure(e.to_string()))?;
        debug!("Sending: {}", String::from_utf8_lossy(&body));

        // Fanout exchanges ignore the routing key.
        channel
            .publish(&self.exchange, "", &body)
            .await
            .map_err(|e| failure(e.to_string()))
    }
}
