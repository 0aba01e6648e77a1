//! Subcommand implementations.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use clap::Args;
use giztoy_topic::{Config, SubscriptionIndex, TopicRules, matches, parse_shared, utf8};
use tracing::debug;

use crate::Cli;

/// Load the config file given with `--config`, or the defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let Some(path) = &cli.config else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let config: Config =
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path))?;
    debug!("loaded config from {}: {:?}", path, config);
    Ok(config)
}

fn rules(cli: &Cli) -> Result<TopicRules> {
    Ok(TopicRules::from(&load_config(cli)?))
}

/// Validate a topic name.
#[derive(Args)]
pub struct NameCommand {
    /// Topic name to check
    pub topic: String,
}

impl NameCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        utf8::validate(self.topic.as_bytes())?;
        rules(cli)?
            .validate_topic_name(&self.topic)
            .with_context(|| format!("topic name {:?}", self.topic))?;
        println!("valid topic name");
        Ok(())
    }
}

/// Validate a topic filter.
#[derive(Args)]
pub struct FilterCommand {
    /// Topic filter to check, optionally `$share/{group}/{filter}`
    pub filter: String,
}

impl FilterCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        utf8::validate(self.filter.as_bytes())?;
        let (group, filter) = match parse_shared(&self.filter) {
            Some((group, filter)) => (Some(group), filter),
            None => (None, self.filter.as_str()),
        };
        rules(cli)?
            .validate_topic_filter(filter)
            .with_context(|| format!("topic filter {:?}", filter))?;
        match group {
            Some(group) => println!("valid shared filter (group {})", group),
            None => println!("valid topic filter"),
        }
        Ok(())
    }
}

/// Match one topic against one filter.
#[derive(Args)]
pub struct MatchCommand {
    /// Topic filter
    pub filter: String,
    /// Topic name
    pub topic: String,
}

impl MatchCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        utf8::validate(self.filter.as_bytes())?;
        utf8::validate(self.topic.as_bytes())?;
        let rules = rules(cli)?;
        rules.validate_topic_filter(&self.filter)?;
        rules.validate_topic_name(&self.topic)?;
        if matches(&self.filter, &self.topic)? {
            println!("match");
        } else {
            println!("no match");
        }
        Ok(())
    }
}

/// Route topics through a subscription file.
///
/// The file maps subscriber names to filter lists:
///
/// ```yaml
/// dashboard: ["home/+/temperature"]
/// logger: ["$share/loggers/home/#"]
/// ```
#[derive(Args)]
pub struct RouteCommand {
    /// Subscription file (YAML)
    #[arg(short = 's', long = "subs")]
    pub subscriptions: String,

    /// Topics to route
    #[arg(required = true)]
    pub topics: Vec<String>,
}

impl RouteCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        let text = fs::read_to_string(&self.subscriptions)
            .with_context(|| format!("failed to read {}", self.subscriptions))?;
        let subscriptions: BTreeMap<String, Vec<String>> = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.subscriptions))?;

        let index = SubscriptionIndex::with_rules(rules(cli)?);
        for (subscriber, filters) in &subscriptions {
            for filter in filters {
                let filter = parse_shared(filter).map_or(filter.as_str(), |(_, f)| f);
                index
                    .insert(filter, subscriber.clone())
                    .with_context(|| format!("subscriber {} filter {:?}", subscriber, filter))?;
            }
        }
        debug!("loaded {} subscriptions", index.len());

        for topic in &self.topics {
            let mut found: Vec<String> = index.find_matches(topic)?.into_iter().collect();
            found.sort();
            println!("{}: {}", topic, found.join(", "));
        }
        Ok(())
    }
}
