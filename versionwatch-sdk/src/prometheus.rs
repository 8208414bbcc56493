//! Prometheus exposition format support.
//!
//! This module renders [`SyncMetrics`] in the Prometheus text-based
//! exposition format and serves it over HTTP next to a health probe.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use versionwatch_sdk::{MetricsServer, PrometheusConfig, SyncMetrics};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:9003")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let metrics = Arc::new(SyncMetrics::new());
//!     let server = MetricsServer::bind(config, metrics).await?;
//!
//!     // Serve until ctrl-c
//!     server
//!         .serve(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::metrics::{MetricsSnapshot, SyncMetrics};

/// Configuration for the Prometheus metrics endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:9003")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
    /// Optional namespace prefix for all metrics
    pub namespace: Option<String>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9003".to_string(),
            metrics_path: "/metrics".to_string(),
            namespace: None,
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
    namespace: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Listen on all interfaces at the given port.
    pub fn port(self, port: u16) -> Self {
        self.listen_addr(format!("0.0.0.0:{}", port))
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Set the namespace prefix for all metrics.
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        PrometheusConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| "0.0.0.0:9003".to_string()),
            metrics_path: self.metrics_path.unwrap_or_else(|| "/metrics".to_string()),
            namespace: self.namespace,
        }
    }
}

/// HTTP server exposing `/metrics` and `/health`.
#[derive(Debug)]
pub struct MetricsServer {
    listener: TcpListener,
    metrics_path: Arc<str>,
    namespace: Option<Arc<str>>,
    metrics: Arc<SyncMetrics>,
}

impl MetricsServer {
    /// Bind the listening socket.
    pub async fn bind(config: PrometheusConfig, metrics: Arc<SyncMetrics>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        Ok(Self {
            listener,
            metrics_path: config.metrics_path.into(),
            namespace: config.namespace.map(Into::into),
            metrics,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already being served finish on their own tasks.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(addr = %self.local_addr()?, path = %self.metrics_path, "metrics server listening");
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    info!("metrics server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted?,
            };
            debug!(%peer, "metrics connection accepted");

            let io = TokioIo::new(stream);
            let metrics_path = self.metrics_path.clone();
            let namespace = self.namespace.clone();
            let metrics = self.metrics.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let metrics_path = metrics_path.clone();
                    let namespace = namespace.clone();
                    let metrics = metrics.clone();

                    async move {
                        handle_request(req, &metrics_path, namespace.as_deref(), &metrics)
                    }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(error = %e, "metrics connection error");
                }
            });
        }
    }
}

fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics_path: &str,
    namespace: Option<&str>,
    metrics: &SyncMetrics,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path();

    let (status, content_type, body) = if path == metrics_path {
        (
            StatusCode::OK,
            "text/plain; version=0.0.4; charset=utf-8",
            format_prometheus(&metrics.snapshot(), namespace),
        )
    } else if path == "/health" || path == "/healthz" {
        (StatusCode::OK, "text/plain", "OK".to_string())
    } else {
        (StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string())
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(content_type),
    );
    Ok(response)
}

fn push_family(output: &mut String, prefix: &str, name: &str, kind: &str, help: &str) {
    output.push_str(&format!("# HELP {}{} {}\n", prefix, name, help));
    output.push_str(&format!("# TYPE {}{} {}\n", prefix, name, kind));
}

/// Format a metrics snapshot as Prometheus exposition format.
pub fn format_prometheus(snapshot: &MetricsSnapshot, namespace: Option<&str>) -> String {
    let mut output = String::new();
    let prefix = namespace.map(|n| format!("{}_", n)).unwrap_or_default();

    push_family(
        &mut output,
        &prefix,
        "versionwatch_sync_runs_total",
        "counter",
        "Total number of sync runs started",
    );
    output.push_str(&format!(
        "{}versionwatch_sync_runs_total {}\n",
        prefix, snapshot.runs_started
    ));

    push_family(
        &mut output,
        &prefix,
        "versionwatch_sync_failures_total",
        "counter",
        "Total number of sync runs that returned an error",
    );
    output.push_str(&format!(
        "{}versionwatch_sync_failures_total {}\n",
        prefix, snapshot.runs_failed
    ));

    push_family(
        &mut output,
        &prefix,
        "versionwatch_messages_published_total",
        "counter",
        "Total number of version messages acknowledged by the broker",
    );
    for (topic, count) in &snapshot.messages_published {
        output.push_str(&format!(
            "{}versionwatch_messages_published_total{{topic=\"{}\"}} {}\n",
            prefix,
            escape_label_value(topic),
            count
        ));
    }

    if let Some(duration) = snapshot.last_run_duration {
        push_family(
            &mut output,
            &prefix,
            "versionwatch_last_sync_duration_seconds",
            "gauge",
            "Duration of the most recent sync run",
        );
        output.push_str(&format!(
            "{}versionwatch_last_sync_duration_seconds {:.6}\n",
            prefix,
            duration.as_secs_f64()
        ));
    }

    if let Some(succeeded) = snapshot.last_run_succeeded {
        push_family(
            &mut output,
            &prefix,
            "versionwatch_last_sync_success",
            "gauge",
            "Whether the most recent sync run succeeded (1) or failed (0)",
        );
        output.push_str(&format!(
            "{}versionwatch_last_sync_success {}\n",
            prefix,
            u8::from(succeeded)
        ));
    }

    if let Some(finished_ms) = snapshot.last_run_finished_ms {
        push_family(
            &mut output,
            &prefix,
            "versionwatch_last_sync_timestamp_seconds",
            "gauge",
            "Unix timestamp of the most recent finished sync run",
        );
        output.push_str(&format!(
            "{}versionwatch_last_sync_timestamp_seconds {:.3}\n",
            prefix,
            finished_ms as f64 / 1000.0
        ));
    }

    output
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
