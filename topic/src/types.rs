//! Common types for giztoy-topic.

use serde::Deserialize;

/// MQTT protocol version.
///
/// In config files the version is written `v4`/`3.1.1` or `v5`. Bare numbers
/// are not accepted, since YAML reads `5` and `5.0` as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ProtocolVersion {
    /// MQTT 3.1.1
    #[default]
    #[serde(alias = "3.1.1", alias = "v4")]
    V4,
    /// MQTT 5.0
    #[serde(alias = "v5")]
    V5,
}

impl ProtocolVersion {
    /// Whether a PUBLISH may carry a zero-length topic name.
    ///
    /// MQTT 5.0 allows it when a topic alias supplies the name.
    pub fn allows_empty_topic_name(self) -> bool {
        matches!(self, ProtocolVersion::V5)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVersion::V4 => write!(f, "MQTT 3.1.1"),
            ProtocolVersion::V5 => write!(f, "MQTT 5.0"),
        }
    }
}
