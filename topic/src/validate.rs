//! Topic name and topic filter grammar.
//!
//! Both checks are a single left-to-right byte scan with no allocation. UTF-8
//! well-formedness is checked separately by [`crate::utf8`].
//!
//! | Input | Accepted | Rejected |
//! |-------|----------|----------|
//! | name | `a/b`, `/`, `a//b`, `$SYS/x` | `a/+`, `a/#`, `a#b` |
//! | filter | `a/+/c`, `+`, `#`, `a/#`, `+/+` | `a+`, `a/+b`, `a/#/c`, `a#` |

use crate::config::Config;
use crate::error::InvalidTopic;
use crate::types::ProtocolVersion;

/// Maximum length of a topic or topic filter in bytes (MQTT-4.7.3-3).
pub const MAX_TOPIC_LEN: usize = 65535;

/// Validation policy for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRules {
    /// Maximum number of `/` separators.
    pub hierarchy_limit: usize,
    /// Accept a zero-length topic name (MQTT 5.0 topic alias).
    pub allow_empty_name: bool,
}

impl Default for TopicRules {
    fn default() -> Self {
        Self {
            hierarchy_limit: crate::config::DEFAULT_HIERARCHY_LIMIT,
            allow_empty_name: false,
        }
    }
}

impl From<&Config> for TopicRules {
    fn from(config: &Config) -> Self {
        Self {
            hierarchy_limit: config.hierarchy_limit,
            allow_empty_name: config.protocol_version.allows_empty_topic_name(),
        }
    }
}

impl TopicRules {
    /// Default rules for the given protocol version.
    pub fn for_protocol(version: ProtocolVersion) -> Self {
        Self {
            allow_empty_name: version.allows_empty_topic_name(),
            ..Self::default()
        }
    }

    /// Set the hierarchy depth limit.
    pub fn hierarchy_limit(mut self, limit: usize) -> Self {
        self.hierarchy_limit = limit;
        self
    }

    /// Allow or reject zero-length topic names.
    pub fn allow_empty_name(mut self, allow: bool) -> Self {
        self.allow_empty_name = allow;
        self
    }

    /// Check a topic name used in PUBLISH.
    ///
    /// Fails on `+` or `#`, on more than 65535 bytes and on more `/`
    /// separators than the hierarchy limit.
    pub fn validate_topic_name(&self, topic: impl AsRef<[u8]>) -> Result<(), InvalidTopic> {
        let bytes = topic.as_ref();
        if bytes.is_empty() {
            return if self.allow_empty_name {
                Ok(())
            } else {
                Err(InvalidTopic::Empty)
            };
        }
        if bytes.len() > MAX_TOPIC_LEN {
            return Err(InvalidTopic::TooLong { len: bytes.len() });
        }

        let mut depth = 0;
        for (offset, &b) in bytes.iter().enumerate() {
            match b {
                b'+' | b'#' => return Err(InvalidTopic::WildcardInName { offset }),
                b'/' => depth += 1,
                _ => {}
            }
        }
        self.check_depth(depth)
    }

    /// Check a topic filter used in SUBSCRIBE or UNSUBSCRIBE.
    ///
    /// A `+` must have `/` or a string boundary on both sides. A `#` must be
    /// the last byte and have `/` or the start of the string before it.
    pub fn validate_topic_filter(&self, filter: impl AsRef<[u8]>) -> Result<(), InvalidTopic> {
        let bytes = filter.as_ref();
        if bytes.is_empty() {
            return Err(InvalidTopic::Empty);
        }
        if bytes.len() > MAX_TOPIC_LEN {
            return Err(InvalidTopic::TooLong { len: bytes.len() });
        }

        let mut depth = 0;
        let mut prev: Option<u8> = None;
        for (offset, &b) in bytes.iter().enumerate() {
            let after_separator = matches!(prev, None | Some(b'/'));
            match b {
                b'+' => {
                    let next = bytes.get(offset + 1).copied();
                    if !after_separator || !matches!(next, None | Some(b'/')) {
                        return Err(InvalidTopic::MisplacedSingleLevel { offset });
                    }
                }
                b'#' => {
                    if !after_separator || offset + 1 != bytes.len() {
                        return Err(InvalidTopic::MisplacedMultiLevel { offset });
                    }
                }
                b'/' => depth += 1,
                _ => {}
            }
            prev = Some(b);
        }
        self.check_depth(depth)
    }

    fn check_depth(&self, depth: usize) -> Result<(), InvalidTopic> {
        if depth > self.hierarchy_limit {
            return Err(InvalidTopic::TooDeep {
                depth,
                limit: self.hierarchy_limit,
            });
        }
        Ok(())
    }
}

/// Check a topic name with the default MQTT 3.1.1 rules.
pub fn validate_topic_name(topic: impl AsRef<[u8]>) -> Result<(), InvalidTopic> {
    TopicRules::default().validate_topic_name(topic)
}

/// Check a topic filter with the default rules.
pub fn validate_topic_filter(filter: impl AsRef<[u8]>) -> Result<(), InvalidTopic> {
    TopicRules::default().validate_topic_filter(filter)
}

/// Whether the string contains `+` or `#` anywhere.
pub fn has_wildcards(s: impl AsRef<[u8]>) -> bool {
    s.as_ref().iter().any(|&b| b == b'+' || b == b'#')
}

/// Whether the topic or filter is a system topic (`$SYS/...`, `$share/...`).
pub fn is_system(s: impl AsRef<[u8]>) -> bool {
    s.as_ref().first() == Some(&b'$')
}
