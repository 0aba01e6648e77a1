//! Topic handling configuration.

use serde::Deserialize;

use crate::types::ProtocolVersion;

/// Default maximum number of `/` separators in a topic or filter.
pub const DEFAULT_HIERARCHY_LIMIT: usize = 200;

/// Default maximum topic aliases per client (MQTT 5.0).
pub const DEFAULT_MAX_TOPIC_ALIAS: u16 = 65535;

/// Topic handling configuration.
///
/// Every field has a default, so a partial YAML/JSON document is enough:
///
/// ```yaml
/// hierarchy_limit: 16
/// protocol_version: v5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of `/` separators in a topic name or filter.
    pub hierarchy_limit: usize,
    /// Protocol version of the connection being served.
    pub protocol_version: ProtocolVersion,
    /// Maximum topic aliases per client (MQTT 5.0).
    pub max_topic_alias: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hierarchy_limit: DEFAULT_HIERARCHY_LIMIT,
            protocol_version: ProtocolVersion::default(),
            max_topic_alias: DEFAULT_MAX_TOPIC_ALIAS,
        }
    }
}

impl Config {
    /// Create a config with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hierarchy depth limit.
    pub fn hierarchy_limit(mut self, limit: usize) -> Self {
        self.hierarchy_limit = limit;
        self
    }

    /// Set the protocol version.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Set maximum topic aliases per client (MQTT 5.0).
    pub fn max_topic_alias(mut self, max: u16) -> Self {
        self.max_topic_alias = max;
        self
    }
}
