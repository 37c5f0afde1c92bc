//! Command-line surface of the `radar` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "radar", author, version, about = "Tax news ingestion and channel previews")]
pub struct Cli {
    /// YAML settings file; defaults to ./radar.yaml, then the user config dir
    #[arg(short, long, global = true, env = "RADAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Copy logs to stderr as well as the log file
    #[arg(long, global = true)]
    pub stderr: bool,

    /// Log directory (overrides RADAR_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Tokio worker threads
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one ingest cycle over candidates from a JSON or YAML file
    Ingest {
        #[arg(long)]
        items: PathBuf,
        /// Override ingest.concurrency
        #[arg(long)]
        concurrency: Option<usize>,
        /// Write accepted records to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run the fetch ladder against one URL
    Fetch {
        url: String,
        /// Print the fetched HTML instead of the attempt log
        #[arg(long)]
        print: bool,
    },

    /// Extract body, image and date from a saved page or a URL
    Extract {
        /// Path to an HTML file, or an http(s) URL
        source: String,
        #[arg(long)]
        title: Option<String>,
        /// Base URL for relative links when reading a file
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Render both preview variants for a markdown draft
    Preview {
        #[arg(long)]
        title: String,
        /// Markdown draft file, optionally split into "Довгий пост"/"Короткий пост"
        #[arg(long)]
        body: PathBuf,
        #[arg(long)]
        link: String,
        #[arg(long, default_value = "")]
        tags: String,
        /// Render the short post instead of the long one
        #[arg(long)]
        short: bool,
    },

    /// Probe the optional fetch engines
    Capabilities,
}
