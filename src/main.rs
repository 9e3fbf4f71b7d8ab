// SafeTerm - Main Entry Point
//
// Web terminal that runs only allowlisted, read-only commands:
// - CLI interface
// - HTTP server for the interactive page
// - One-shot verdict and run commands for local testing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use safeterm::{logging, server, Config};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// SafeTerm: sandboxed web terminal
#[derive(Parser, Debug)]
#[command(name = "safeterm")]
#[command(author = "SafeTerm Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Web terminal that only runs allowlisted read-only commands", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file (default: XDG config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<IpAddr>,

        /// Listening port
        #[arg(short, long)]
        port: Option<u16>,

        /// Per-command deadline in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print the verdict for a command without running it
    Check {
        /// Command line to classify
        #[arg(allow_hyphen_values = true)]
        command: String,
    },
    /// Run one command through the gate and print its output
    Run {
        /// Command line to run
        #[arg(allow_hyphen_values = true)]
        command: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    logging::init(&config, args.verbose)?;

    match args.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        timeout_secs: None,
    }) {
        Commands::Serve {
            host,
            port,
            timeout_secs,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(secs) = timeout_secs {
                config.execution.timeout_secs = secs;
            }
            config.validate()?;

            info!(
                "SafeTerm v{} starting (timeout {}s, {} allowed prefixes, {} blocked patterns)",
                env!("CARGO_PKG_VERSION"),
                config.execution.timeout_secs,
                config.policy.allowlist.len(),
                config.policy.blocklist.len()
            );

            let terminal = Arc::new(config.build_terminal());
            server::serve(config.bind_addr(), terminal).await?;
        }
        Commands::Check { command } => {
            let verdict = config.build_terminal().validator().validate(&command);
            println!("{}", verdict);
        }
        Commands::Run { command } => {
            let output = config.build_terminal().run(&command).await;
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}
