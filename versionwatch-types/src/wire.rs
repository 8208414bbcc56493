//! Schema-registry wire envelope.

use core::fmt;

use crate::{decode_version, encode_version, SerializationError, Version};

/// Format marker that starts every message value.
pub const MAGIC_BYTE: u8 = 0x00;

/// Length of the envelope prefix: magic byte plus a 4 byte schema id.
pub const ENVELOPE_LEN: usize = 5;

/// Identifier of a registered schema version for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SchemaId(pub u32);

impl SchemaId {
    /// Create a schema id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Big-endian encoding as it appears on the wire.
    pub const fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for SchemaId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message value split into its envelope and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Schema the payload was written with.
    pub schema_id: SchemaId,
    /// Avro binary payload, without the envelope.
    pub payload: Vec<u8>,
}

impl WireMessage {
    /// Encode a version into a complete message value:
    /// `[0x00][schema id, 4 bytes BE][Avro payload]`.
    pub fn encode(version: &Version, schema_id: SchemaId) -> Result<Vec<u8>, SerializationError> {
        let payload = encode_version(version)?;
        let mut bytes = Vec::with_capacity(ENVELOPE_LEN + payload.len());
        bytes.push(MAGIC_BYTE);
        bytes.extend_from_slice(&schema_id.to_be_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Strip the envelope from a received message value.
    pub fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        if bytes.len() < ENVELOPE_LEN {
            return Err(SerializationError::Envelope(format!(
                "value has {} bytes, need at least {}",
                bytes.len(),
                ENVELOPE_LEN
            )));
        }
        if bytes[0] != MAGIC_BYTE {
            return Err(SerializationError::Envelope(format!(
                "unknown magic byte 0x{:02x}",
                bytes[0]
            )));
        }

        let id = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        Ok(Self {
            schema_id: SchemaId(id),
            payload: bytes[ENVELOPE_LEN..].to_vec(),
        })
    }

    /// Decode the payload as a version record.
    pub fn version(&self) -> Result<Version, SerializationError> {
        decode_version(&self.payload)
    }
}
