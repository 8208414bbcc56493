//! Avro binary codec for [`Version`] records.
//!
//! The payload is a bare Avro datum (not an object container file), as
//! expected by schema-registry aware consumers.

use std::sync::OnceLock;

use apache_avro::types::Value as AvroValue;
use apache_avro::{from_avro_datum, to_avro_datum, Schema as AvroSchema};

use crate::{SerializationError, Version};

/// Avro schema registered for the topic's message values.
///
/// Field order is part of the wire contract: `applicationName`, then `number`.
pub const VERSION_SCHEMA: &str = r#"{
  "type": "record",
  "name": "ApplicationVersionAvailable",
  "namespace": "versionwatch",
  "fields": [
    {"name": "applicationName", "type": "string"},
    {"name": "number", "type": "string"}
  ]
}"#;

const APPLICATION_NAME_FIELD: &str = "applicationName";
const NUMBER_FIELD: &str = "number";

static PARSED_SCHEMA: OnceLock<Result<AvroSchema, String>> = OnceLock::new();

/// The parsed value schema, parsed once per process.
pub fn value_schema() -> Result<&'static AvroSchema, SerializationError> {
    PARSED_SCHEMA
        .get_or_init(|| AvroSchema::parse_str(VERSION_SCHEMA).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| SerializationError::Schema(e.clone()))
}

/// Serialize a version into an Avro binary datum.
pub fn encode_version(version: &Version) -> Result<Vec<u8>, SerializationError> {
    let schema = value_schema()?;
    let record = AvroValue::Record(vec![
        (
            APPLICATION_NAME_FIELD.to_string(),
            AvroValue::String(version.application_name().to_string()),
        ),
        (
            NUMBER_FIELD.to_string(),
            AvroValue::String(version.number().to_string()),
        ),
    ]);
    Ok(to_avro_datum(schema, record)?)
}

/// Deserialize an Avro binary datum back into a version.
pub fn decode_version(payload: &[u8]) -> Result<Version, SerializationError> {
    let schema = value_schema()?;
    let mut reader = payload;
    let value = from_avro_datum(schema, &mut reader, None)?;

    let fields = match value {
        AvroValue::Record(fields) => fields,
        other => {
            return Err(SerializationError::Avro(format!(
                "expected record, got {:?}",
                other
            )))
        }
    };

    let mut application_name = None;
    let mut number = None;
    for (name, value) in fields {
        let text = match value {
            AvroValue::String(s) => s,
            other => {
                return Err(SerializationError::Avro(format!(
                    "field '{}' is not a string: {:?}",
                    name, other
                )))
            }
        };
        match name.as_str() {
            APPLICATION_NAME_FIELD => application_name = Some(text),
            NUMBER_FIELD => number = Some(text),
            _ => {}
        }
    }

    match (application_name, number) {
        (Some(application_name), Some(number)) => Ok(Version::new(application_name, number)),
        _ => Err(SerializationError::Avro(
            "record is missing applicationName or number".to_string(),
        )),
    }
}
