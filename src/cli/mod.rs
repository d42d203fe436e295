mod commands;
pub mod error;
mod utils;

#[cfg(test)]
mod mod_test;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::{VikunjaClient, install_crypto_provider};
use crate::config::{ConfigStore, default_config_path};
use crate::instances::{DEBUG_VAR, Environment, InstanceResolver, ProcessEnv};
use crate::mcp::VikunjaMcpServer;
use crate::query::DEFAULT_FOCUS_LIMIT;

pub use commands::serve::Transport;

#[derive(Parser)]
#[command(name = "vikunja-mcp")]
#[command(author, version, about = "MCP server for Vikunja task management", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.vikunja-mcp/config.yaml)
    #[arg(long, global = true, env = "VIKUNJA_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server (the default when no command is given)
    Serve {
        /// Transport to serve MCP on
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,
        /// Host address to bind to (http only)
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        /// Port to listen on (http only)
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// List configured Vikunja instances
    Instances {
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show tasks that are overdue or urgent, across instances
    Focus {
        /// Only query this instance
        #[arg(long)]
        instance: Option<String>,
        /// Maximum tasks to show (0: no limit)
        #[arg(long, default_value_t = DEFAULT_FOCUS_LIMIT)]
        limit: usize,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show task counts across instances
    Summary {
        /// Only query this instance
        #[arg(long)]
        instance: Option<String>,
        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

/// Log filter used when `RUST_LOG` is not set.
pub(crate) fn default_filter(verbose: u8, debug_env: bool) -> &'static str {
    match verbose {
        0 if !debug_env => "vikunja_mcp=info",
        0 | 1 => "vikunja_mcp=debug",
        _ => "vikunja_mcp=trace,rmcp=debug,tower_http=debug",
    }
}

/// Initialize tracing subscriber with env filter.
///
/// Logs go to stderr; stdout carries MCP traffic in stdio mode.
fn init_tracing(verbose: u8) {
    let debug_env = ProcessEnv
        .var(DEBUG_VAR)
        .is_some_and(|v| !v.trim().is_empty());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(verbose, debug_env).into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_client(config: PathBuf) -> VikunjaClient<ProcessEnv> {
    debug!("Using config file {}", config.display());
    let resolver = InstanceResolver::new(ConfigStore::new(config), ProcessEnv);
    VikunjaClient::new(Arc::new(resolver))
}

pub async fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_crypto_provider();

    let client = build_client(cli.config.unwrap_or_else(default_config_path));

    match cli.command.unwrap_or(Commands::Serve {
        transport: Transport::Stdio,
        host: IpAddr::from([127, 0, 0, 1]),
        port: 8000,
    }) {
        Commands::Serve {
            transport,
            host,
            port,
        } => {
            let server = VikunjaMcpServer::new(client);
            commands::serve::serve(server, transport, SocketAddr::new(host, port)).await?;
        }
        Commands::Instances { format } => {
            let output = commands::instances::list_instances(client.resolver(), &format)?;
            println!("{}", output);
        }
        Commands::Focus {
            instance,
            limit,
            format,
        } => {
            let output =
                commands::query::focus(&client, instance.as_deref(), limit, &format).await?;
            println!("{}", output);
        }
        Commands::Summary { instance, format } => {
            let output = commands::query::summary(&client, instance.as_deref(), &format).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
