//! # versionwatch-adapters
//!
//! The collaborators of a versionwatch sync run: where versions come from,
//! how their schema id is resolved, and where they are published.
//!
//! ## Components
//!
//! - [`catalog`]: [`CatalogFetcher`] reads the tag list of a Docker registry
//!   v2 repository and streams one [`Version`] per tag into a channel
//! - [`registry`]: [`CachedSchemaRegistry`] resolves a subject to a schema id
//!   over the Confluent REST API and caches it for the process lifetime
//! - [`publisher`]: [`Publisher`] drains the channel, wraps each version in
//!   the wire envelope and hands it to a [`MessageProducer`]
//! - [`kafka`] (`kafka` feature): [`kafka::KafkaProducer`], the rdkafka backed
//!   producer waiting for acknowledgement from all in-sync replicas
//! - [`stop`]: [`StopToken`], the cooperative cancellation flag shared by
//!   the tasks of a run
//!
//! ## Example
//!
//! ```rust,no_run
//! use versionwatch_adapters::{CatalogFetcher, Fetch, StopToken};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = CatalogFetcher::builder()
//!         .base_url("https://gcr.io")
//!         .repository("google_containers/hyperkube-amd64")
//!         .application_name("Kubernetes")
//!         .build()?;
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(4);
//!     let stop = StopToken::new();
//!     let fetch = tokio::spawn(async move { fetcher.fetch(&stop, tx).await });
//!
//!     while let Some(version) = rx.recv().await {
//!         println!("{}", version);
//!     }
//!     fetch.await??;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod stop;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use catalog::{CatalogFetcher, CatalogFetcherBuilder, Fetch};
pub use error::{FetchError, ProducerError, PublishError, RegistryError};
pub use publisher::{MessageProducer, Publish, Publisher};
pub use registry::{CachedSchemaRegistry, CachedSchemaRegistryBuilder, SchemaRegistry, StaticSchemaRegistry};
pub use stop::StopToken;

// Re-export types for convenience
pub use versionwatch_types::{SchemaId, Version, WireMessage};
