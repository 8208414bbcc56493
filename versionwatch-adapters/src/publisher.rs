//! Publisher draining the version channel into the broker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use versionwatch_sdk::{NoopObserver, SyncObserver};
use versionwatch_types::{Version, WireMessage};

use crate::{ProducerError, PublishError, SchemaRegistry, StopToken};

/// Sends a keyed message and waits for the broker acknowledgement.
///
/// Transport-level retries belong to the implementation; an `Err` means
/// the message is lost for this run.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Send `value` to `topic` with partition key `key`.
    async fn send(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ProducerError>;
}

#[async_trait]
impl<T: MessageProducer + ?Sized> MessageProducer for Arc<T> {
    async fn send(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ProducerError> {
        (**self).send(topic, key, value).await
    }
}

/// Consumes versions from a channel.
///
/// Implementations own the receiver. They return `Ok(())` when the channel
/// is closed or a stop is requested, and abort with the first error.
#[async_trait]
pub trait Publish: Send + Sync {
    /// Publish every version received until the channel closes.
    async fn publish(
        &self,
        stop: &StopToken,
        versions: mpsc::Receiver<Version>,
    ) -> Result<(), PublishError>;
}

/// Publishes versions to a topic in the schema-registry wire format.
///
/// Each message is keyed `"<application name>-<number>"` so every message
/// for one version lands in the same partition.
pub struct Publisher<R, P> {
    registry: R,
    producer: P,
    topic: String,
    subject: String,
    observer: Arc<dyn SyncObserver>,
}

impl<R, P> Publisher<R, P>
where
    R: SchemaRegistry,
    P: MessageProducer,
{
    /// Create a publisher for `topic`, resolving ids for `"<topic>-value"`.
    pub fn new(producer: P, registry: R, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let subject = format!("{}-value", topic);
        Self {
            registry,
            producer,
            topic,
            subject,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report acknowledged messages to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Registry subject the schema id is resolved for.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Resolve, encode and send a single version.
    pub async fn publish_version(&self, version: &Version) -> Result<(), PublishError> {
        let schema_id = self
            .registry
            .schema_id(&self.subject)
            .await
            .map_err(PublishError::SchemaResolution)?;

        let value = WireMessage::encode(version, schema_id).map_err(PublishError::Serialization)?;

        let key = version.partition_key();
        self.producer
            .send(&self.topic, &key, &value)
            .await
            .map_err(PublishError::Send)?;

        debug!(topic = %self.topic, %key, %schema_id, "send message successful");
        self.observer.message_published(&self.topic, &key);
        Ok(())
    }
}

#[async_trait]
impl<R, P> Publish for Publisher<R, P>
where
    R: SchemaRegistry,
    P: MessageProducer,
{
    async fn publish(
        &self,
        stop: &StopToken,
        mut versions: mpsc::Receiver<Version>,
    ) -> Result<(), PublishError> {
        loop {
            let version = tokio::select! {
                biased;
                _ = stop.stopped() => {
                    debug!("stop requested => return");
                    return Ok(());
                }
                received = versions.recv() => match received {
                    Some(version) => version,
                    None => {
                        debug!("channel closed => return");
                        return Ok(());
                    }
                },
            };
            self.publish_version(&version).await?;
        }
    }
}

impl<R, P> std::fmt::Debug for Publisher<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .field("subject", &self.subject)
            .finish()
    }
}
