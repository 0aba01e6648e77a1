//! mqtt-topic - check and route MQTT topics from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{FilterCommand, MatchCommand, NameCommand, RouteCommand};

/// mqtt-topic - check and route MQTT topics.
///
/// Validates topic names and filters with the same rules a broker applies,
/// and shows which subscriptions a published topic is delivered to.
#[derive(Parser)]
#[command(name = "mqtt-topic")]
#[command(about = "MQTT topic validation and routing tool")]
#[command(version)]
pub struct Cli {
    /// Config file (YAML): hierarchy_limit, protocol_version, max_topic_alias
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a topic name (PUBLISH)
    Name(NameCommand),
    /// Validate a topic filter (SUBSCRIBE)
    Filter(FilterCommand),
    /// Check whether a topic matches a filter
    Match(MatchCommand),
    /// Route topics through a subscription file
    Route(RouteCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Name(cmd) => cmd.run(&cli),
        Commands::Filter(cmd) => cmd.run(&cli),
        Commands::Match(cmd) => cmd.run(&cli),
        Commands::Route(cmd) => cmd.run(&cli),
    }
}
