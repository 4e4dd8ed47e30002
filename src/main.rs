//! search-gateway: a multi-tenant search routing gateway.
//!
//! Resolves a tenant from each request, fingerprints it for caching,
//! classifies it as simple/complex/hybrid, and dispatches to the
//! appropriate backend engine adapter under a latency deadline.

use clap::{Parser, Subcommand};
use search_gateway::{config, server::GatewayServer, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "search-gateway")]
#[command(about = "Multi-tenant search routing gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SEARCH_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEARCH_GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty, compact)
    #[arg(long, env = "SEARCH_GATEWAY_LOG_FORMAT", default_value = "json")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Start {
        /// Server host, overrides configuration
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides configuration
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format);

    info!("search-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Start { host, port } => {
            let mut loaded = match &cli.config {
                Some(path) => config::Config::from_file(path)?,
                None => config::Config::discover_and_load()?,
            };

            if let Some(host) = host {
                loaded.server.host = host;
            }
            if let Some(port) = port {
                loaded.server.port = port;
            }

            loaded.validate()?;

            let server = GatewayServer::new_with_config_path(loaded, cli.config.clone()).await?;
            server.run().await?;
        }

        Commands::Validate { config: config_path } => match config::Config::validate_file(&config_path) {
            Ok(()) => {
                println!("configuration valid");
            }
            Err(e) => {
                eprintln!("configuration error: {e}");
                std::process::exit(1);
            }
        },

        Commands::Config => {
            let default_config = config::Config::default();
            match serde_yaml::to_string(&default_config) {
                Ok(yaml) => println!("{yaml}"),
                Err(e) => {
                    eprintln!("failed to render default configuration: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        "pretty" => registry.with(fmt::layer().pretty()).init(),
        "compact" => registry.with(fmt::layer().compact()).init(),
        _ => registry.with(fmt::layer().json()).init(),
    }
}
