use crate::config::MessageBrokerConfig;
use crate::error::Error;
use crate::messaging::{AuditLogger, ChannelProvider, FramerPublisher, PublishReport};
use crate::validation;
use log::debug;
use serde_json::Value;
use std::sync::Arc;

/// Validates camera batches and fans them out to the framers
#[derive(Clone)]
pub struct CameraIngestService {
    audit: AuditLogger,
    publisher: FramerPublisher,
}

impl CameraIngestService {
    pub fn new(provider: Arc<dyn ChannelProvider>, config: &MessageBrokerConfig) -> Self {
        let audit = AuditLogger::new(provider.clone(), config.audit_queue.clone());
        let publisher = FramerPublisher::new(provider, audit.clone(), config.exchange.clone());
        Self { audit, publisher }
    }

    /// Process one `{"cameras": [...]}` request body.
    ///
    /// Client errors and `BrokerUnavailable` abort the batch before anything
    /// is published. Once the broker is reached the batch is accepted, even
    /// if individual groups fail to publish.
    pub async fn ingest(&self, body: &Value) -> Result<PublishReport, Error> {
        debug!("Incoming payload: {}", body);

        let groups = match validation::validate_batch(body) {
            Ok(groups) => groups,
            Err(e) => {
                self.audit.log_exception(e.to_string()).await;
                return Err(e);
            }
        };

        let report = match self.publisher.publish_batch(&groups).await {
            Ok(report) => report,
            Err(e) => {
                self.audit.log_exception(e.to_string()).await;
                return Err(e);
            }
        };

        self.audit
            .log_info("All camera data processed successfully.")
            .await;
        Ok(report)
    }
}
