//! CLI commands and argument parsing

use crate::sources::SourceKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated ad-analytics relay
#[derive(Parser, Debug)]
#[command(name = "insights-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Pull one source to stdout or a file
    Pull {
        /// Source to pull
        #[arg(short, long)]
        source: SourceKind,

        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Upstream API key
        #[arg(long)]
        api_key: String,

        /// Campaign ids, comma-separated (conversion journey)
        #[arg(long)]
        campaign_ids: Option<String>,

        /// Tracker ids, comma-separated (conversion journey)
        #[arg(long)]
        tracker_ids: Option<String>,

        /// Delivery granularity (advertiser delivery stats)
        #[arg(long)]
        granularity: Option<String>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List built-in sources
    Sources,

    /// Validate the configuration file
    Validate {
        /// Also check that the warehouse table is readable
        #[arg(long)]
        check_warehouse: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}
