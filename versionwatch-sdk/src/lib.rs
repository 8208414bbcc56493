//! # versionwatch-sdk
//!
//! Telemetry for versionwatch sync runs.
//!
//! The sync pipeline never calls a global logger or metrics registry for its
//! bookkeeping. Instead it is handed a [`SyncObserver`] and reports lifecycle
//! points to it: run started, run finished, message published. [`SyncMetrics`]
//! is the observer used in production; it keeps lock-free counters that the
//! Prometheus endpoint renders on every scrape.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use versionwatch_sdk::{RunOutcome, SyncMetrics, SyncObserver};
//!
//! let metrics = Arc::new(SyncMetrics::new());
//!
//! metrics.run_started();
//! metrics.message_published("versions", "Kubernetes-v1");
//! metrics.run_finished(RunOutcome::Succeeded, Duration::from_millis(120));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.runs_succeeded, 1);
//! assert_eq!(snapshot.messages_published["versions"], 1);
//! ```
//!
//! ## Features
//!
//! - `prometheus` (default): text exposition and the HTTP metrics server

mod metrics;
mod observer;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use observer::{NoopObserver, RunOutcome, SyncObserver};

#[cfg(feature = "prometheus")]
pub use prometheus::{MetricsServer, PrometheusConfig};
