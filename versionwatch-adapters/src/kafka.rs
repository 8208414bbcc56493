//! Kafka producer for publishing version messages.
//!
//! This adapter wraps an rdkafka `FutureProducer` (librdkafka bindings)
//! configured for durable, ordered delivery:
//!
//! - **acks=all**: a send succeeds only once every in-sync replica has it
//! - **bounded retries**: librdkafka retries transient failures itself
//! - **idempotence**: retried sends keep their order within a partition
//!
//! ## Example
//!
//! ```rust,no_run
//! use versionwatch_adapters::kafka::KafkaProducer;
//! use versionwatch_adapters::MessageProducer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let producer = KafkaProducer::builder()
//!         .brokers("localhost:9092")
//!         .build()?;
//!
//!     producer.send("versions", "Kubernetes-v1", b"\x00\x00\x00\x00\x01").await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::{MessageProducer, ProducerError};

/// rdkafka backed producer waiting for acknowledgement from all replicas.
pub struct KafkaProducer {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaProducer {
    /// Create a new builder for configuring the producer.
    pub fn builder() -> KafkaProducerBuilder {
        KafkaProducerBuilder::default()
    }

    /// Wait for outstanding messages to be delivered.
    pub fn flush(&self, timeout: Duration) -> Result<(), ProducerError> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| ProducerError::Delivery(e.to_string()))
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn send(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ProducerError> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok(delivery) => {
                debug!(topic, key, ?delivery, "message acknowledged");
                Ok(())
            }
            Err((err, _message)) => Err(ProducerError::Delivery(err.to_string())),
        }
    }
}

impl std::fmt::Debug for KafkaProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaProducer")
            .field("queue_timeout", &self.queue_timeout)
            .finish()
    }
}

/// Builder for KafkaProducer.
#[derive(Debug, Default)]
pub struct KafkaProducerBuilder {
    brokers: Option<String>,
    max_retries: Option<u32>,
    message_timeout: Option<Duration>,
    queue_timeout: Option<Duration>,
}

impl KafkaProducerBuilder {
    /// Set the Kafka broker addresses (comma-separated).
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set how often librdkafka retries a failed send (default: 10).
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the overall delivery timeout, retries included (default: 30 seconds).
    pub fn message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = Some(timeout);
        self
    }

    /// Set how long a send may wait for room in the local queue (default: 5 seconds).
    pub fn queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = Some(timeout);
        self
    }

    fn client_config(&self) -> ClientConfig {
        let brokers = self
            .brokers
            .clone()
            .unwrap_or_else(|| "localhost:9092".to_string());
        let max_retries = self.max_retries.unwrap_or(10);
        let message_timeout = self.message_timeout.unwrap_or(Duration::from_secs(30));

        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &brokers);
        config.set("acks", "all");
        config.set("enable.idempotence", "true");
        config.set("message.send.max.retries", max_retries.to_string());
        config.set("message.timeout.ms", message_timeout.as_millis().to_string());
        config
    }

    /// Build the producer.
    pub fn build(self) -> Result<KafkaProducer, ProducerError> {
        let config = self.client_config();
        let producer: FutureProducer = config
            .create()
            .map_err(|e| ProducerError::Config(e.to_string()))?;

        info!(
            brokers = config.get("bootstrap.servers").unwrap_or_default(),
            "kafka producer created"
        );

        Ok(KafkaProducer {
            producer,
            queue_timeout: self.queue_timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}
