//! Catalog fetcher using the Docker registry v2 HTTP API.
//!
//! The catalog lists every tag of a single repository at
//! `GET <base-url>/v2/<repository>/tags/list`:
//!
//! ```json
//! {"name": "google_containers/hyperkube-amd64", "tags": ["v1.9.0", "v1.9.1"]}
//! ```
//!
//! Each tag becomes one [`Version`] of the tracked application. The fetcher
//! performs exactly one request per call: no retry, pagination or dedupe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use versionwatch_types::Version;

use crate::{FetchError, StopToken};

/// Produces versions into a channel.
///
/// Implementations own the sender and close the channel by dropping it when
/// they return. A stop request is not an error: the implementation returns
/// `Ok(())` with whatever it has already sent.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch versions and send them, in order, to `versions`.
    async fn fetch(&self, stop: &StopToken, versions: mpsc::Sender<Version>) -> Result<(), FetchError>;
}

/// Fetches the tag list of one repository and emits a version per tag.
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    client: Client,
    base_url: String,
    repository: String,
    application_name: String,
}

impl CatalogFetcher {
    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> CatalogFetcherBuilder {
        CatalogFetcherBuilder::default()
    }

    /// URL of the tag list endpoint.
    pub fn tags_url(&self) -> String {
        format!("{}/v2/{}/tags/list", self.base_url, self.repository)
    }

    /// Name given to every emitted version.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Request the tag list.
    pub async fn fetch_tags(&self) -> Result<Vec<String>, FetchError> {
        let request = self
            .client
            .get(self.tags_url())
            .build()
            .map_err(FetchError::RequestBuild)?;
        debug!(method = %request.method(), url = %request.url(), "fetching catalog tags");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus(status));
        }

        let body = response.bytes().await.map_err(FetchError::Request)?;
        parse_tags(&body)
    }
}

#[async_trait]
impl Fetch for CatalogFetcher {
    async fn fetch(&self, stop: &StopToken, versions: mpsc::Sender<Version>) -> Result<(), FetchError> {
        let tags = self.fetch_tags().await?;
        info!(count = tags.len(), url = %self.tags_url(), "catalog tags fetched");

        for tag in tags {
            if stop.is_stopped() {
                info!("stop requested => return");
                return Ok(());
            }

            let version = Version::new(self.application_name.as_str(), tag);
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    info!("stop requested => return");
                    return Ok(());
                }
                sent = versions.send(version) => {
                    if sent.is_err() {
                        debug!("version receiver dropped => return");
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Builder for CatalogFetcher.
#[derive(Debug, Default)]
pub struct CatalogFetcherBuilder {
    base_url: Option<String>,
    repository: Option<String>,
    application_name: Option<String>,
    timeout: Option<Duration>,
    client: Option<Client>,
}

impl CatalogFetcherBuilder {
    /// Set the registry base URL (default: "https://gcr.io").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the repository path (default: "google_containers/hyperkube-amd64").
    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Set the application name stamped on every version (default: "Kubernetes").
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing HTTP client. The timeout setting is ignored.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> Result<CatalogFetcher, FetchError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
                .build()
                .map_err(FetchError::RequestBuild)?,
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://gcr.io".to_string());
        let repository = self
            .repository
            .unwrap_or_else(|| "google_containers/hyperkube-amd64".to_string());

        Ok(CatalogFetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.trim_matches('/').to_string(),
            application_name: self
                .application_name
                .unwrap_or_else(|| "Kubernetes".to_string()),
        })
    }
}

/// Tag list returned by the registry.
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Decode a tag list body. A missing or null `tags` field is an empty list.
pub fn parse_tags(body: &[u8]) -> Result<Vec<String>, FetchError> {
    let list: TagList = serde_json::from_slice(body).map_err(FetchError::Decode)?;
    Ok(list.tags.unwrap_or_default())
}
