//! Error types for adapters.

use thiserror::Error;
use versionwatch_types::SerializationError;

/// Errors that can occur while fetching the catalog tag list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client or request could not be built.
    #[error("build request failed: {0}")]
    RequestBuild(#[source] reqwest::Error),

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The catalog answered with a status outside 2xx.
    #[error("request status code {0} is not 2xx")]
    UnexpectedStatus(reqwest::StatusCode),

    /// The body is not a valid tag list.
    #[error("decode json failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors that can occur while resolving a schema id.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry could not be reached or answered with a server error.
    #[error("schema registry unavailable: {0}")]
    Unavailable(String),

    /// The registry does not know the subject.
    #[error("subject '{0}' not found")]
    SubjectNotFound(String),

    /// The registry refused the request.
    #[error("schema registry rejected request with status {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },

    /// The registry response could not be parsed.
    #[error("failed to parse schema registry response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Unavailable(err.to_string())
    }
}

/// Errors raised by a message producer.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// The producer could not be created from its configuration.
    #[error("create producer failed: {0}")]
    Config(String),

    /// The broker did not acknowledge the message, retries included.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Errors that abort a publish call, tagged with the failing stage.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Looking up the schema id failed.
    #[error("get schema id failed: {0}")]
    SchemaResolution(#[source] RegistryError),

    /// Encoding the version failed.
    #[error("serialize version failed: {0}")]
    Serialization(#[source] SerializationError),

    /// The broker send failed.
    #[error("send message to kafka failed: {0}")]
    Send(#[source] ProducerError),
}
