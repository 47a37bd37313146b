//! fleetd — the fleet registry daemon.
//!
//! Single binary that assembles the registry subsystems:
//! - In-memory registry store (devices + actions)
//! - Action executor (simulated asynchronous execution)
//! - gRPC service (`FleetManager`)
//!
//! # Usage
//!
//! ```text
//! fleetd --port 50051
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use fleet_grpc::FleetServer;
use fleet_registry::{ActionExecutor, RegistryStore};

#[derive(Parser)]
#[command(name = "fleetd", about = "Fleet registry daemon")]
struct Cli {
    /// Port for the gRPC listener.
    #[arg(long, default_value = "50051")]
    port: u16,

    /// Minimum simulated action execution delay in seconds.
    #[arg(long, default_value = "10")]
    exec_delay_min: u64,

    /// Maximum simulated action execution delay in seconds.
    #[arg(long, default_value = "20")]
    exec_delay_max: u64,

    /// Probability that a simulated action succeeds (0.0–1.0).
    #[arg(long, default_value = "0.8")]
    exec_success_rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,fleetd=debug,fleet_registry=debug,fleet_grpc=debug"
                    .parse()
                    .unwrap()
            }),
        )
        .init();

    let cli = Cli::parse();

    info!("fleet registry daemon starting");

    let store = RegistryStore::new();
    info!("registry store initialized");

    let executor = ActionExecutor::new(store.clone())
        .with_delay_range(
            Duration::from_secs(cli.exec_delay_min),
            Duration::from_secs(cli.exec_delay_max),
        )
        .with_success_rate(cli.exec_success_rate);
    info!(
        delay_min = cli.exec_delay_min,
        delay_max = cli.exec_delay_max,
        success_rate = cli.exec_success_rate,
        "action executor initialized"
    );

    let server = FleetServer::new(store, executor);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!(%addr, "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(server.into_service())
        .serve_with_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;

    info!("fleetd stopped");
    Ok(())
}
