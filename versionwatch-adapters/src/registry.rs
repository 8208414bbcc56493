//! Schema-registry client with a per-subject id cache.
//!
//! Ids are resolved through the Confluent Schema Registry REST API by
//! registering the version value schema under the subject. Registration is
//! idempotent: a schema that already exists yields its existing id.
//!
//! ## Example
//!
//! ```rust,no_run
//! use versionwatch_adapters::{CachedSchemaRegistry, SchemaRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = CachedSchemaRegistry::builder()
//!         .url("http://localhost:8081")
//!         .build()?;
//!
//!     let id = registry.schema_id("versions-value").await?;
//!     println!("schema id: {}", id);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use versionwatch_types::{SchemaId, VERSION_SCHEMA};

use crate::RegistryError;

const REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Resolves a subject name to a schema id.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Schema id for `subject` (conventionally `"<topic>-value"`).
    async fn schema_id(&self, subject: &str) -> Result<SchemaId, RegistryError>;
}

#[async_trait]
impl<T: SchemaRegistry + ?Sized> SchemaRegistry for Arc<T> {
    async fn schema_id(&self, subject: &str) -> Result<SchemaId, RegistryError> {
        (**self).schema_id(subject).await
    }
}

/// Registry client that remembers every resolved subject.
///
/// Entries never expire: subjects map to append-only schema evolutions, so
/// an id stays valid for the lifetime of the process. Lookups take a read
/// lock; only a miss takes the write lock to insert.
#[derive(Debug)]
pub struct CachedSchemaRegistry {
    client: Client,
    url: String,
    schema: String,
    cache: RwLock<HashMap<String, SchemaId>>,
}

impl CachedSchemaRegistry {
    /// Create a new builder for configuring the client.
    pub fn builder() -> CachedSchemaRegistryBuilder {
        CachedSchemaRegistryBuilder::default()
    }

    /// Cached id for a subject, if it was resolved before.
    pub fn cached(&self, subject: &str) -> Option<SchemaId> {
        self.cache.read().get(subject).copied()
    }

    /// Number of subjects in the cache.
    pub fn cached_subjects(&self) -> usize {
        self.cache.read().len()
    }

    async fn register(&self, subject: &str) -> Result<SchemaId, RegistryError> {
        let url = format!("{}/subjects/{}/versions", self.url, subject);
        let body = serde_json::to_vec(&RegisterRequest {
            schema: &self.schema,
        })
        .map_err(|e| RegistryError::Parse(e.to_string()))?;

        debug!(%url, subject, "resolving schema id");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, REGISTRY_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::SubjectNotFound(subject.to_string()));
        }
        if status.is_server_error() {
            return Err(RegistryError::Unavailable(format!(
                "registry returned status {}",
                status
            )));
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_default();
            return Err(RegistryError::Rejected { status, message });
        }

        let registered: RegisterResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(e.to_string()))?;

        Ok(SchemaId::new(registered.id))
    }
}

#[async_trait]
impl SchemaRegistry for CachedSchemaRegistry {
    async fn schema_id(&self, subject: &str) -> Result<SchemaId, RegistryError> {
        if subject.is_empty() {
            return Err(RegistryError::SubjectNotFound(String::new()));
        }

        // Fast path: check if it exists
        if let Some(id) = self.cached(subject) {
            return Ok(id);
        }

        let id = self.register(subject).await?;

        // Keep the first id if a concurrent lookup won the race
        let id = *self
            .cache
            .write()
            .entry(subject.to_string())
            .or_insert(id);
        info!(subject, schema_id = %id, "schema id resolved");
        Ok(id)
    }
}

/// Builder for CachedSchemaRegistry.
#[derive(Debug, Default)]
pub struct CachedSchemaRegistryBuilder {
    url: Option<String>,
    schema: Option<String>,
    timeout: Option<Duration>,
    client: Option<Client>,
}

impl CachedSchemaRegistryBuilder {
    /// Set the registry base URL (default: "http://localhost:8081").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Register a different schema (default: the version value schema).
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
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

    /// Build the client.
    pub fn build(self) -> Result<CachedSchemaRegistry, RegistryError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
                .build()
                .map_err(|e| RegistryError::Unavailable(e.to_string()))?,
        };

        let url = self
            .url
            .unwrap_or_else(|| "http://localhost:8081".to_string());

        Ok(CachedSchemaRegistry {
            client,
            url: url.trim_end_matches('/').to_string(),
            schema: self.schema.unwrap_or_else(|| VERSION_SCHEMA.to_string()),
            cache: RwLock::new(HashMap::new()),
        })
    }
}

/// Registry that answers every subject with one configured id.
///
/// Used when the schema id is provisioned out of band.
#[derive(Debug, Clone, Copy)]
pub struct StaticSchemaRegistry {
    id: SchemaId,
}

impl StaticSchemaRegistry {
    /// Create a registry that always returns `id`.
    pub fn new(id: SchemaId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl SchemaRegistry for StaticSchemaRegistry {
    async fn schema_id(&self, subject: &str) -> Result<SchemaId, RegistryError> {
        if subject.is_empty() {
            return Err(RegistryError::SubjectNotFound(String::new()));
        }
        Ok(self.id)
    }
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let registry = CachedSchemaRegistry::builder().build().unwrap();
        assert_eq!(registry.url, "http://localhost:8081");
        assert_eq!(registry.schema, VERSION_SCHEMA);
        assert_eq!(registry.cached_subjects(), 0);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let registry = CachedSchemaRegistry::builder()
            .url("http://schema-registry:8081/")
            .build()
            .unwrap();
        assert_eq!(registry.url, "http://schema-registry:8081");
    }

    #[test]
    fn test_register_request_body() {
        let body = serde_json::to_string(&RegisterRequest { schema: "\"string\"" }).unwrap();
        assert_eq!(body, r#"{"schema":"\"string\""}"#);
    }

    #[tokio::test]
    async fn test_static_registry() {
        let registry = StaticSchemaRegistry::new(SchemaId::new(7));
        assert_eq!(registry.schema_id("versions-value").await.unwrap(), SchemaId::new(7));
        assert_eq!(registry.schema_id("other-value").await.unwrap(), SchemaId::new(7));
    }

    #[tokio::test]
    async fn empty_subject_is_not_found() {
        let registry = StaticSchemaRegistry::new(SchemaId::new(7));
        let err = registry.schema_id("").await.unwrap_err();
        assert!(matches!(err, RegistryError::SubjectNotFound(_)));

        let registry = CachedSchemaRegistry::builder().build().unwrap();
        let err = registry.schema_id("").await.unwrap_err();
        assert!(matches!(err, RegistryError::SubjectNotFound(_)));
    }

    #[tokio::test]
    async fn cached_subject_skips_request() {
        // Nothing listens here; a request would fail.
        let registry = CachedSchemaRegistry::builder()
            .url("http://127.0.0.1:9")
            .build()
            .unwrap();
        registry
            .cache
            .write()
            .insert("versions-value".to_string(), SchemaId::new(3));

        assert_eq!(registry.schema_id("versions-value").await.unwrap(), SchemaId::new(3));
    }
}
