//! In-memory stand-in for RabbitMQ used by unit tests.

use crate::error::Error;
use crate::messaging::broker::{BrokerChannel, ChannelProvider};
use crate::messaging::event::{AuditEvent, FramerMessage};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct State {
    unavailable: bool,
    fail_exchange_declare: bool,
    fail_audit_publishes: bool,
    /// 1-based attempt numbers on non-default exchanges that must fail
    failing_attempts: HashSet<usize>,
    exchange_attempts: usize,
    attempts_by_exchange: Vec<String>,
    invalidations: usize,
    declared_exchanges: Vec<String>,
    declared_queues: Vec<String>,
    published: Vec<PublishedMessage>,
}

#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<State>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(&self) -> Arc<dyn ChannelProvider> {
        Arc::new(self.clone())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn fail_exchange_declare(&self, fail: bool) {
        self.state.lock().unwrap().fail_exchange_declare = fail;
    }

    pub fn fail_audit_publishes(&self, fail: bool) {
        self.state.lock().unwrap().fail_audit_publishes = fail;
    }

    /// Fail the n-th (1-based) publish attempt on a named exchange
    pub fn fail_framer_publish(&self, attempt: usize) {
        self.state.lock().unwrap().failing_attempts.insert(attempt);
    }

    pub fn invalidations(&self) -> usize {
        self.state.lock().unwrap().invalidations
    }

    pub fn declared_exchanges(&self) -> Vec<String> {
        self.state.lock().unwrap().declared_exchanges.clone()
    }

    pub fn declared_queues(&self) -> Vec<String> {
        self.state.lock().unwrap().declared_queues.clone()
    }

    /// Publish attempts on an exchange, failed ones included
    pub fn publish_attempts(&self, exchange: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .attempts_by_exchange
            .iter()
            .filter(|name| name.as_str() == exchange)
            .count()
    }

    pub fn published_to(&self, exchange: &str) -> Vec<PublishedMessage> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|m| m.exchange == exchange)
            .cloned()
            .collect()
    }

    pub fn framer_messages(&self, exchange: &str) -> Vec<FramerMessage> {
        self.published_to(exchange)
            .iter()
            .map(|m| serde_json::from_slice(&m.body).unwrap())
            .collect()
    }

    pub fn audit_events(&self, queue: &str) -> Vec<AuditEvent> {
        self.published_to("")
            .iter()
            .filter(|m| m.routing_key == queue)
            .map(|m| serde_json::from_slice(&m.body).unwrap())
            .collect()
    }
}

#[async_trait]
impl ChannelProvider for InMemoryBroker {
    async fn acquire_channel(&self) -> Result<Arc<dyn BrokerChannel>, Error> {
        if self.state.lock().unwrap().unavailable {
            return Err(Error::BrokerUnavailable("connection refused".to_string()));
        }

        Ok(Arc::new(InMemoryChannel {
            state: self.state.clone(),
        }))
    }

    async fn invalidate(&self) {
        self.state.lock().unwrap().invalidations += 1;
    }
}

struct InMemoryChannel {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_exchange_declare {
            return Err(Error::Amqp("PRECONDITION_FAILED".to_string()));
        }
        if !state.declared_exchanges.iter().any(|e| e == exchange) {
            state.declared_exchanges.push(exchange.to_string());
        }
        Ok(())
    }

    async fn declare_queue(&self, queue: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if !state.declared_queues.iter().any(|q| q == queue) {
            state.declared_queues.push(queue.to_string());
        }
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.attempts_by_exchange.push(exchange.to_string());

        if exchange.is_empty() {
            if state.fail_audit_publishes {
                return Err(Error::Amqp("channel closed".to_string()));
            }
        } else {
            state.exchange_attempts += 1;
            let attempt = state.exchange_attempts;
            if state.failing_attempts.contains(&attempt) {
                return Err(Error::Amqp("channel closed".to_string()));
            }
        }

        state.published.push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            body: payload.to_vec(),
        });
        Ok(())
    }
}
