//! MQTT topic validation, wildcard matching and subscription routing.
//!
//! This crate is the part of a broker that decides which subscribers receive
//! a published message:
//!
//! - **Validation**: reject malformed topic names (PUBLISH) and topic filters
//!   (SUBSCRIBE) before they reach routing.
//! - **Matching**: the `+` / `#` / `$SYS` rules of MQTT 3.1.1 and 5.0 for a
//!   single filter/topic pair.
//! - **Index**: a level trie over every registered filter, shared between
//!   connections behind a reader-writer lock.
//! - **Aliases**: the per-connection MQTT 5.0 topic alias table.
//!
//! ## Example
//!
//! ```rust
//! use giztoy_topic::{matches, validate_topic_filter, SubscriptionIndex};
//!
//! validate_topic_filter("sport/+/player1").unwrap();
//! assert!(matches("sport/#", "sport").unwrap());
//!
//! let index = SubscriptionIndex::new();
//! index.insert("sport/tennis/+", "client-1").unwrap();
//! index.insert("sport/#", "client-2").unwrap();
//!
//! let subscribers = index.find_matches("sport/tennis/player1").unwrap();
//! assert_eq!(subscribers.len(), 2);
//! ```

pub mod alias;
mod config;
mod error;
pub mod index;
mod matcher;
mod types;
pub mod utf8;
pub mod validate;

pub use alias::TopicAliases;
pub use config::{Config, DEFAULT_HIERARCHY_LIMIT, DEFAULT_MAX_TOPIC_ALIAS};
pub use error::{Error, InvalidTopic, Result};
pub use index::{SubscriptionIndex, parse_shared};
pub use matcher::matches;
pub use types::ProtocolVersion;
pub use validate::{
    MAX_TOPIC_LEN, TopicRules, has_wildcards, is_system, validate_topic_filter,
    validate_topic_name,
};
