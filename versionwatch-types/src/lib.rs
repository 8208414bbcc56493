//! # versionwatch-types
//!
//! Core types shared by every versionwatch crate: the [`Version`] record that
//! flows through the sync pipeline, its Avro value schema, and the
//! schema-registry wire envelope that wraps every message published to Kafka.
//!
//! ## Wire format
//!
//! ```text
//! ┌──────┬──────────────────────┬──────────────────────────────────┐
//! │ 0x00 │ schema id (u32, BE)  │ Avro binary {applicationName,    │
//! │      │                      │              number}             │
//! └──────┴──────────────────────┴──────────────────────────────────┘
//!   1 B           4 B                       variable
//! ```
//!
//! ## Example
//!
//! ```rust
//! use versionwatch_types::{SchemaId, Version, WireMessage};
//!
//! let version = Version::new("Kubernetes", "v1.29.0");
//! let bytes = WireMessage::encode(&version, SchemaId::new(42)).unwrap();
//!
//! assert_eq!(bytes[0], 0x00);
//! assert_eq!(&bytes[1..5], &[0, 0, 0, 42]);
//!
//! let message = WireMessage::decode(&bytes).unwrap();
//! assert_eq!(message.schema_id, SchemaId::new(42));
//! assert_eq!(message.version().unwrap(), version);
//! ```
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for [`Version`] and [`SchemaId`]

mod avro;
mod error;
mod version;
mod wire;

pub use avro::{decode_version, encode_version, value_schema, VERSION_SCHEMA};
pub use error::SerializationError;
pub use version::Version;
pub use wire::{SchemaId, WireMessage, ENVELOPE_LEN, MAGIC_BYTE};
