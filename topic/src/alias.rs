//! MQTT 5.0 topic aliases.
//!
//! A connection may replace a topic name with a small integer after it has
//! sent the pair once. The table is owned by the connection's worker and
//! dropped, or [`clear`](TopicAliases::clear)ed, at disconnect.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::config::{Config, DEFAULT_MAX_TOPIC_ALIAS};
use crate::error::{Error, Result};
use crate::validate::TopicRules;

/// Alias → topic name mapping for one connection.
#[derive(Debug, Clone)]
pub struct TopicAliases {
    aliases: HashMap<u16, String>,
    max_alias: u16,
    rules: TopicRules,
}

impl Default for TopicAliases {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOPIC_ALIAS)
    }
}

impl TopicAliases {
    /// Create an empty table accepting aliases `1..=max_alias`.
    pub fn new(max_alias: u16) -> Self {
        Self {
            aliases: HashMap::new(),
            max_alias,
            rules: TopicRules::default(),
        }
    }

    /// Create an empty table using the alias limit and topic rules of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            aliases: HashMap::new(),
            max_alias: config.max_topic_alias,
            rules: TopicRules::from(config),
        }
    }

    /// Highest alias accepted.
    pub fn max_alias(&self) -> u16 {
        self.max_alias
    }

    /// Register `topic` under `alias`, replacing any previous topic.
    ///
    /// The topic must be a valid, non-empty topic name.
    pub fn add(&mut self, alias: u16, topic: &str) -> Result<()> {
        if alias == 0 || alias > self.max_alias {
            return Err(Error::AliasOutOfRange {
                alias,
                max: self.max_alias,
            });
        }
        self.rules.allow_empty_name(false).validate_topic_name(topic)?;

        let mut owned = String::new();
        owned.try_reserve_exact(topic.len())?;
        owned.push_str(topic);

        if let Some(existing) = self.aliases.get_mut(&alias) {
            *existing = owned;
        } else {
            self.aliases.try_reserve(1)?;
            self.aliases.insert(alias, owned);
        }
        trace!("topic alias {} = '{}'", alias, topic);
        Ok(())
    }

    /// Topic registered under `alias`.
    pub fn find(&self, alias: u16) -> Result<&str> {
        self.aliases
            .get(&alias)
            .map(String::as_str)
            .ok_or(Error::NotFound(alias))
    }

    /// Resolve the topic of an incoming PUBLISH.
    ///
    /// - topic and alias: register the alias, use the topic
    /// - empty topic and alias: use the registered topic
    /// - topic only: use the topic
    /// - neither: protocol error
    pub fn resolve<'a>(&'a mut self, topic: &'a str, alias: Option<u16>) -> Result<&'a str> {
        match alias {
            Some(alias) if !topic.is_empty() => {
                self.add(alias, topic)?;
                Ok(topic)
            }
            Some(alias) => self.find(alias).inspect_err(|_| {
                warn!("unknown topic alias {}", alias);
            }),
            None if !topic.is_empty() => Ok(topic),
            None => Err(Error::EmptyTopicNoAlias),
        }
    }

    /// Drop every alias.
    pub fn clear(&mut self) {
        self.aliases.clear();
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns true if no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InvalidTopic;
    use crate::types::ProtocolVersion;

    #[test]
    fn test_add_and_find() {
        let mut aliases = TopicAliases::new(10);
        aliases.add(1, "sensors/temp").unwrap();
        aliases.add(2, "sensors/humidity").unwrap();

        assert_eq!(aliases.find(1).unwrap(), "sensors/temp");
        assert_eq!(aliases.find(2).unwrap(), "sensors/humidity");
        assert_eq!(aliases.find(3), Err(Error::NotFound(3)));
        assert_eq!(aliases.len(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut aliases = TopicAliases::new(10);
        aliases.add(1, "a").unwrap();
        aliases.add(1, "b").unwrap();

        assert_eq!(aliases.find(1).unwrap(), "b");
        assert_eq!(aliases.len(), 1);
    }

    #[test]
    fn test_alias_range() {
        let mut aliases = TopicAliases::new(5);
        assert_eq!(
            aliases.add(0, "a"),
            Err(Error::AliasOutOfRange { alias: 0, max: 5 })
        );
        assert_eq!(
            aliases.add(6, "a"),
            Err(Error::AliasOutOfRange { alias: 6, max: 5 })
        );
        assert!(aliases.add(5, "a").is_ok());
    }

    #[test]
    fn test_topic_must_be_a_valid_name() {
        let mut aliases = TopicAliases::new(5);
        assert_eq!(
            aliases.add(1, "a/+"),
            Err(Error::InvalidTopic(InvalidTopic::WildcardInName { offset: 2 }))
        );
        assert_eq!(
            aliases.add(1, ""),
            Err(Error::InvalidTopic(InvalidTopic::Empty))
        );
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut aliases = TopicAliases::default();
        aliases.add(1, "a").unwrap();
        aliases.add(2, "b").unwrap();
        aliases.clear();

        assert!(aliases.is_empty());
        assert_eq!(aliases.find(1), Err(Error::NotFound(1)));
    }

    #[test]
    fn test_resolve() {
        let config = Config::new()
            .protocol_version(ProtocolVersion::V5)
            .max_topic_alias(3);
        let mut aliases = TopicAliases::from_config(&config);

        assert_eq!(aliases.resolve("a/b", Some(1)).unwrap(), "a/b");
        assert_eq!(aliases.resolve("", Some(1)).unwrap(), "a/b");
        assert_eq!(aliases.resolve("c", None).unwrap(), "c");
        assert_eq!(aliases.resolve("", Some(2)), Err(Error::NotFound(2)));
        assert_eq!(aliases.resolve("", None), Err(Error::EmptyTopicNoAlias));
        assert_eq!(
            aliases.resolve("x", Some(4)),
            Err(Error::AliasOutOfRange { alias: 4, max: 3 })
        );
    }
}
