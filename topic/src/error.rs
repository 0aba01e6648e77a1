//! Error types for giztoy-topic.

use std::collections::TryReserveError;

/// Result type alias for giztoy-topic.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for topic operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed topic name or topic filter.
    #[error("invalid topic: {0}")]
    InvalidTopic(#[from] InvalidTopic),

    /// Topic bytes are not well-formed MQTT UTF-8.
    #[error("invalid utf-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// Topic alias is not registered on this connection.
    #[error("topic alias {0} not found")]
    NotFound(u16),

    /// Topic alias is zero or above the negotiated maximum.
    #[error("topic alias {alias} out of range (max {max})")]
    AliasOutOfRange { alias: u16, max: u16 },

    /// PUBLISH carried neither a topic name nor a topic alias.
    #[error("empty topic without topic alias")]
    EmptyTopicNoAlias,

    /// Allocation failed while growing the index or the alias table.
    #[error("out of memory")]
    OutOfMemory,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

/// Reason a topic name or topic filter was rejected.
///
/// Offsets are byte positions into the rejected string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTopic {
    /// Zero-length topic where one is required.
    #[error("topic is empty")]
    Empty,

    /// Longer than the 65535 bytes a length prefix can carry.
    #[error("topic is {len} bytes, limit is 65535")]
    TooLong { len: usize },

    /// More `/` separators than the configured hierarchy limit.
    #[error("topic has {depth} levels below root, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },

    /// `+` or `#` in a topic name.
    #[error("wildcard at byte {offset} in topic name")]
    WildcardInName { offset: usize },

    /// `+` sharing a level with other characters.
    #[error("'+' at byte {offset} does not occupy a whole level")]
    MisplacedSingleLevel { offset: usize },

    /// `#` that is not the whole final level.
    #[error("'#' at byte {offset} is not the whole last level")]
    MisplacedMultiLevel { offset: usize },
}
