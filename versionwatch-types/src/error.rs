//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors raised while encoding or decoding a version record.
///
/// These always indicate a schema mismatch or a corrupt message; they are
/// never worth retrying.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The embedded Avro schema could not be parsed.
    #[error("Invalid Avro schema: {0}")]
    Schema(String),

    /// Avro encoding or decoding failed.
    #[error("Avro codec failed: {0}")]
    Avro(String),

    /// The wire envelope is malformed.
    #[error("Invalid wire envelope: {0}")]
    Envelope(String),
}

impl From<apache_avro::Error> for SerializationError {
    fn from(err: apache_avro::Error) -> Self {
        SerializationError::Avro(err.to_string())
    }
}
