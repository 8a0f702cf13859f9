//! drivegate CLI: serve local directories as `dat://` drives.
//!
//! ```bash
//! drivegate serve --drive blog=./public --port 8080
//! curl http://127.0.0.1:8080/blog/
//!
//! drivegate fetch --drive blog=./public dat://blog/index.html
//! ```
//!
//! See `drivegate --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use commands::DriveSpec;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drivegate", about = "dat:// drive gateway", version)]
struct Cli {
    /// Configuration file (default: ./drivegate.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve drives over HTTP
    Serve {
        /// Listening address
        #[arg(long)]
        host: Option<String>,

        /// Listening port
        #[arg(long)]
        port: Option<u16>,

        /// Publish a directory as a drive, as NAME=DIR (repeatable)
        #[arg(long = "drive", value_name = "NAME=DIR")]
        drives: Vec<DriveSpec>,
    },

    /// Run a single request through the gateway and print the response
    Fetch {
        /// Publish a directory as a drive, as NAME=DIR (repeatable)
        #[arg(long = "drive", value_name = "NAME=DIR")]
        drives: Vec<DriveSpec>,

        /// Request method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Accept header
        #[arg(long)]
        accept: Option<String>,

        /// Range header, e.g. bytes=0-99
        #[arg(long)]
        range: Option<String>,

        /// dat:// URL to request
        url: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    match cli.command {
        Commands::Serve { host, port, drives } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve::run(config, &drives).await
        }
        Commands::Fetch { drives, method, accept, range, url } => {
            let request = commands::fetch::FetchRequest { method, accept, range, url };
            commands::fetch::run(config, &drives, request).await
        }
    }
}
