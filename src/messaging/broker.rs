use crate::config::MessageBrokerConfig;
use crate::error::Error;
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Operations the ingest pipeline needs from an open broker channel
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declare a durable fanout exchange. Idempotent.
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), Error>;

    /// Declare a durable queue. Idempotent.
    async fn declare_queue(&self, queue: &str) -> Result<(), Error>;

    /// Publish a JSON payload
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error>;
}

/// Source of healthy broker channels
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Return a usable channel, reconnecting if the cached one is gone.
    async fn acquire_channel(&self) -> Result<Arc<dyn BrokerChannel>, Error>;

    /// Drop the cached connection so the next acquisition reconnects
    async fn invalidate(&self);
}

/// lapin channel wrapper
pub struct AmqpChannel {
    channel: Channel,
    /// Queues already declared on this channel
    declared_queues: Mutex<HashSet<String>>,
}

impl AmqpChannel {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            declared_queues: Mutex::new(HashSet::new()),
        }
    }

    fn is_open(&self) -> bool {
        self.channel.status().connected()
    }
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), Error> {
        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::Amqp(format!("Failed to declare exchange {}: {}", exchange, e)))
    }

    async fn declare_queue(&self, queue: &str) -> Result<(), Error> {
        let mut declared = self.declared_queues.lock().await;
        if declared.contains(queue) {
            return Ok(());
        }

        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::Amqp(format!("Failed to declare queue {}: {}", queue, e)))?;

        debug!("Declared queue: {}", queue);
        declared.insert(queue.to_string());
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2)
            .with_message_id(Uuid::new_v4().to_string().into());

        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await
            .map_err(|e| Error::Amqp(format!("Failed to publish message: {}", e)))?;

        Ok(())
    }
}

/// An open connection together with its publish channel
pub trait BrokerSession: Send + Sync {
    /// Whether both the connection and the channel are still usable
    fn is_open(&self) -> bool;

    fn channel(&self) -> Arc<dyn BrokerChannel>;
}

/// Opens broker sessions for `BrokerConnection`
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, Error>;
}

struct AmqpSession {
    connection: Connection,
    channel: Arc<AmqpChannel>,
}

impl BrokerSession for AmqpSession {
    fn is_open(&self) -> bool {
        self.connection.status().connected() && self.channel.is_open()
    }

    fn channel(&self) -> Arc<dyn BrokerChannel> {
        self.channel.clone()
    }
}

/// Connects to RabbitMQ with lapin
pub struct AmqpConnector {
    config: MessageBrokerConfig,
}

impl AmqpConnector {
    pub fn new(config: MessageBrokerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, Error> {
        let connection = Connection::connect(&self.config.uri(), ConnectionProperties::default())
            .await
            .map_err(|e| Error::Amqp(format!("Failed to create AMQP connection: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| Error::Amqp(format!("Failed to create RabbitMQ channel: {}", e)))?;

        info!(
            "Connected to RabbitMQ at {}:{} (heartbeat {}s)",
            self.config.host, self.config.port, self.config.heartbeat_secs
        );

        Ok(Box::new(AmqpSession {
            connection,
            channel: Arc::new(AmqpChannel::new(channel)),
        }))
    }
}

/// Lazily connected, process-wide RabbitMQ connection.
///
/// Exactly one session is cached. The health check and the reconnect run
/// under the same lock, so concurrent requests never open competing
/// connections.
pub struct BrokerConnection {
    connector: Box<dyn BrokerConnector>,
    cached: Mutex<Option<Box<dyn BrokerSession>>>,
}

impl BrokerConnection {
    /// Create an unconnected broker handle. Nothing touches the network
    /// until the first `acquire_channel`.
    pub fn new(config: MessageBrokerConfig) -> Self {
        Self::with_connector(AmqpConnector::new(config))
    }

    pub fn with_connector(connector: impl BrokerConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChannelProvider for BrokerConnection {
    async fn acquire_channel(&self) -> Result<Arc<dyn BrokerChannel>, Error> {
        let mut cached = self.cached.lock().await;

        if let Some(existing) = &*cached {
            if existing.is_open() {
                return Ok(existing.channel());
            }
            debug!("Cached RabbitMQ channel is closed, reconnecting");
        }

        // Stale state must not survive a failed reconnect.
        *cached = None;

        match self.connector.connect().await {
            Ok(fresh) => {
                let channel = fresh.channel();
                *cached = Some(fresh);
                Ok(channel)
            }
            Err(e) => {
                warn!("RabbitMQ connection failed: {}", e);
                Err(Error::BrokerUnavailable(e.to_string()))
            }
        }
    }

    async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("Discarded cached RabbitMQ connection");
        }
    }
}
