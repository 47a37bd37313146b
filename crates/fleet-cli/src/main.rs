//! fleetctl — operator CLI for the fleet registry.
//!
//! Thin gRPC client over the `FleetManager` service: register and
//! inspect devices, kick off software updates, and watch actions run
//! to a terminal status.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fleetctl",
    about = "Fleet registry operator CLI",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Fleet server address (host:port).
    #[arg(long, global = true, default_value = "127.0.0.1:50051")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new device
    Register {
        device_id: String,
    },
    /// Get device info
    Info {
        device_id: String,
    },
    /// List devices
    List,
    /// Start a software update on a device
    Update {
        device_id: String,
        /// Version to install, passed to the device as an action parameter.
        #[arg(long)]
        version: String,
    },
    /// Get action status
    Status {
        action_id: String,
    },
    /// Poll action status until it reaches a terminal state
    Poll {
        action_id: String,
        /// Seconds between polls.
        #[arg(long, default_value = "2")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleetctl=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register { device_id } => commands::register(&cli.addr, &device_id).await,
        Commands::Info { device_id } => commands::info(&cli.addr, &device_id).await,
        Commands::List => commands::list(&cli.addr).await,
        Commands::Update { device_id, version } => {
            commands::update(&cli.addr, &device_id, &version).await
        }
        Commands::Status { action_id } => commands::status(&cli.addr, &action_id).await,
        Commands::Poll {
            action_id,
            interval,
        } => commands::poll(&cli.addr, &action_id, interval).await,
    }
}
