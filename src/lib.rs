//! # versionwatch
//!
//! Collects every available version of a tracked application from a Docker
//! registry catalog and publishes each one to a Kafka topic, once per
//! interval.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            App                               │
//! │  ┌───────────┐   tick   ┌──────────────────────────────────┐ │
//! │  │ WaitCron  │────────▶│ Syncer                            │ │
//! │  └───────────┘          │  CatalogFetcher ──mpsc──▶ Publisher │
//! │                         └───────────────┬──────────────────┘ │
//! │                                         │ SyncObserver       │
//! │  ┌───────────────┐                      ▼                    │
//! │  │ MetricsServer │◀──────────────── SyncMetrics             │
//! │  └───────────────┘                                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`sync`]**: one run, fetch and publish joined by a bounded channel
//! - **[`race`]**: the fail-fast and first-finish task group combinators
//! - **[`scheduler`]**: [`WaitCron`], a fixed delay between runs
//! - **[`settings`]**: command line, environment and file configuration
//! - **[`app`]**: wiring plus the scheduler/metrics-server pair
//!
//! The collaborators live in `versionwatch-adapters`, the record and wire
//! format in `versionwatch-types`, telemetry in `versionwatch-sdk`.
//!
//! ## Usage
//!
//! ```bash
//! versionwatch \
//!   --kafka-brokers kafka:9092 \
//!   --kafka-topic versions \
//!   --kafka-schema-registry-url http://schema-registry:8081 \
//!   --wait 1h
//! ```

pub mod app;
pub mod race;
pub mod scheduler;
pub mod settings;
pub mod sync;

pub use app::{App, VersionPublisher};
#[cfg(feature = "kafka")]
pub use app::KafkaApp;
pub use scheduler::WaitCron;
pub use settings::{parse_duration, Args, Settings, SettingsError};
pub use sync::{SyncError, Syncer};
