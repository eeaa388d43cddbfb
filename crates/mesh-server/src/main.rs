//! MeshDiag server entry point.
//!
//! Binds the listening socket and serves connections until Ctrl-C, routing
//! service-port packets to the logging handler and everything else to the
//! protocol's default service handler.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::info;
use tracing_subscriber::EnvFilter;

use mesh_core::{DispatchLoop, LoopbackTransport};

use mesh_server::cli::CommandLine;
use mesh_server::config::{default_config_path, load_config};
use mesh_server::handler::LogHandler;
use mesh_server::identity::local_identity;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CommandLine::parse_args();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)?;
    if let Some(address) = cli.address {
        config.node.address = address;
    }

    info!(
        protocol_version = cli.protocol_version,
        address = config.node.address,
        service_port = config.server.service_port,
        "MeshDiag server starting"
    );

    let transport = Arc::new(LoopbackTransport::new());
    transport.register_node(
        config.node.address,
        Some(local_identity(&config.node.hostname)),
    );

    // Shutdown flag cleared by the Ctrl-C handler.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let handler = Arc::new(LogHandler::new());
    let mut dispatch = DispatchLoop::new(transport, config.dispatch_config(), handler.clone());
    let socket = dispatch.bind();

    dispatch.run(&socket, &running).await;

    info!(
        received = dispatch.received(),
        "MeshDiag server stopped"
    );
    Ok(())
}
