//! The version record produced by the catalog fetcher.

use core::fmt;

/// An available version of a tracked application.
///
/// Produced once per catalog tag and consumed once by the publisher.
/// Fields are private so a record cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Version {
    application_name: String,
    number: String,
}

impl Version {
    /// Create a new version record.
    pub fn new(application_name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            number: number.into(),
        }
    }

    /// Name of the application this version belongs to (e.g. "Kubernetes").
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// The version number, exactly as the catalog reported the tag.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Message key used for partition locality: `"<application_name>-<number>"`.
    pub fn partition_key(&self) -> String {
        format!("{}-{}", self.application_name, self.number)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.application_name, self.number)
    }
}
