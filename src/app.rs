//! Process wiring: the scheduled sync pipeline next to the metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use versionwatch_adapters::{
    CachedSchemaRegistry, CatalogFetcher, Fetch, MessageProducer, Publish, Publisher, SchemaId,
    SchemaRegistry, StaticSchemaRegistry, StopToken,
};
use versionwatch_sdk::{MetricsServer, PrometheusConfig, SyncMetrics};

use crate::race::{cancel_on_first_finish, Task};
use crate::scheduler::WaitCron;
use crate::settings::Settings;
use crate::sync::Syncer;

/// Publisher resolving schema ids through whichever registry the settings name.
pub type VersionPublisher<P> = Publisher<Arc<dyn SchemaRegistry>, P>;

/// The production application: catalog in, Kafka out.
#[cfg(feature = "kafka")]
pub type KafkaApp = App<CatalogFetcher, VersionPublisher<versionwatch_adapters::kafka::KafkaProducer>>;

/// A scheduled syncer and the metrics server, run as one unit.
pub struct App<F, P> {
    cron: WaitCron,
    syncer: Syncer<F, P>,
    server: MetricsServer,
    metrics: Arc<SyncMetrics>,
}

impl<F, P> App<F, P>
where
    F: Fetch,
    P: Publish,
{
    pub fn new(cron: WaitCron, syncer: Syncer<F, P>, server: MetricsServer, metrics: Arc<SyncMetrics>) -> Self {
        Self {
            cron,
            syncer,
            server,
            metrics,
        }
    }

    /// Address the metrics endpoint is bound to.
    pub fn metrics_addr(&self) -> Result<SocketAddr> {
        self.server
            .local_addr()
            .context("read metrics server address failed")
    }

    /// Counters shared by the pipeline and the metrics endpoint.
    pub fn metrics(&self) -> Arc<SyncMetrics> {
        self.metrics.clone()
    }

    /// Run until `stop` is stopped or either half exits; the first to exit
    /// stops the other.
    pub async fn run(self, stop: &StopToken) -> Result<()> {
        let App {
            cron,
            syncer,
            server,
            ..
        } = self;
        let syncer = &syncer;

        let scheduler: Task<'_, anyhow::Error> = Box::pin(async move {
            cron.run(stop, move || syncer.sync(stop)).await;
            Ok(())
        });

        let shutdown = stop.clone();
        let http: Task<'_, anyhow::Error> = Box::pin(async move {
            server
                .serve(async move { shutdown.stopped().await })
                .await
                .context("metrics server failed")
        });

        cancel_on_first_finish(stop, vec![scheduler, http]).await
    }
}

impl<P> App<CatalogFetcher, VersionPublisher<P>>
where
    P: MessageProducer,
{
    /// Wire every component from `settings`, publishing through `producer`.
    pub async fn with_producer(settings: &Settings, producer: P) -> Result<Self> {
        let metrics = Arc::new(SyncMetrics::new());

        let fetcher = CatalogFetcher::builder()
            .base_url(settings.catalog_url.as_str())
            .repository(settings.catalog_repository.as_str())
            .application_name(settings.application_name.as_str())
            .build()
            .context("create catalog fetcher failed")?;

        let registry: Arc<dyn SchemaRegistry> = match settings.schema_id {
            Some(id) => {
                info!(schema_id = id, "using static schema id");
                Arc::new(StaticSchemaRegistry::new(SchemaId::new(id)))
            }
            None => {
                let url = settings
                    .kafka_schema_registry_url
                    .as_deref()
                    .context("kafka schema registry url is required")?;
                Arc::new(
                    CachedSchemaRegistry::builder()
                        .url(url)
                        .build()
                        .context("create schema registry client failed")?,
                )
            }
        };

        let publisher = Publisher::new(producer, registry, settings.kafka_topic.as_str())
            .with_observer(metrics.clone());
        let syncer = Syncer::new(fetcher, publisher).with_observer(metrics.clone());

        let config = PrometheusConfig::builder().port(settings.port).build();
        let server = MetricsServer::bind(config, metrics.clone())
            .await
            .with_context(|| format!("listen on port {} failed", settings.port))?;

        Ok(Self::new(WaitCron::new(settings.wait), syncer, server, metrics))
    }
}

#[cfg(feature = "kafka")]
impl KafkaApp {
    /// Wire the application with an rdkafka producer for `settings.kafka_brokers`.
    pub async fn build(settings: &Settings) -> Result<Self> {
        let producer = versionwatch_adapters::kafka::KafkaProducer::builder()
            .brokers(settings.kafka_brokers.as_str())
            .build()
            .context("create kafka producer failed")?;
        Self::with_producer(settings, producer).await
    }
}
