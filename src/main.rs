use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pystep::config::EngineConfig;
use pystep::engine::DebugEngine;
use pystep::server::ApiServer;

/// Stepped Python execution engine for interactive algorithm visualization
#[derive(Parser)]
#[command(name = "pystep")]
#[command(about = "Step through Python scripts one line at a time", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the debug session HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Path to a TOML configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Interpreter program override (default: python3)
        #[arg(long)]
        interpreter: Option<String>,

        /// Base URL of the static-analysis service
        #[arg(long)]
        analyzer_url: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pystep={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            port,
            config,
            interpreter,
            analyzer_url,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            if let Some(interpreter) = interpreter {
                config.interpreter = interpreter;
            }
            if let Some(url) = analyzer_url {
                config.analyzer_url = Some(url);
            }

            let engine = Arc::new(DebugEngine::production(config));
            ApiServer::new(engine, port).start().await
        }
    }
}
