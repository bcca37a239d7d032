//! Oolite unified CLI.
//!
//! One binary covers both sides of the wire: `serve` runs a replica node,
//! everything else is a client command against a running node.
//!
//! # Quick Start
//!
//! ```bash
//! # Start a node (reads oolite.toml, then OOLITE_* overrides)
//! oolite serve
//!
//! # Write and read from another terminal
//! oolite put fleet anaconda
//! oolite get fleet
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Oolite - a peer-replicated, eventually-consistent key-value store.
#[derive(Parser)]
#[command(name = "oolite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a replica node in the foreground.
    Serve {
        /// Directory searched for oolite.toml (default: current directory).
        #[arg(short, long)]
        config_dir: Option<String>,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// Directory searched for oolite.toml (default: current directory).
        #[arg(short, long)]
        config_dir: Option<String>,
    },

    /// Write a value. Reads the key's current causal context first, so a
    /// plain put never fails as stale.
    Put {
        key: String,
        value: String,

        /// Node address to coordinate the write.
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        server: String,
    },

    /// Read a key. Multiple lines mean concurrent revisions.
    Get {
        key: String,

        /// Node address to coordinate the read.
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        server: String,
    },

    /// Ask a node for its identity token.
    Identity {
        /// Node address.
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        server: String,
    },

    /// Tell a node to drain its pending-repair ledger now.
    Gossip {
        /// Node address.
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        server: String,
    },

    /// Simulate an outage on a node.
    Crash {
        /// Outage duration in seconds.
        seconds: u64,

        /// Node address.
        #[arg(short, long, default_value = "127.0.0.1:7400")]
        server: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config_dir } => commands::serve::run(config_dir.as_deref()),
        Commands::Config { config_dir } => commands::config::run(config_dir.as_deref()),
        Commands::Put { key, value, server } => commands::kv::put(&server, &key, &value),
        Commands::Get { key, server } => commands::kv::get(&server, &key),
        Commands::Identity { server } => commands::admin::identity(&server),
        Commands::Gossip { server } => commands::admin::gossip(&server),
        Commands::Crash { seconds, server } => commands::admin::crash(&server, seconds),
    }
}
