//! MeshDiag client entry point.
//!
//! Wires the loopback transport, scans the address range, then runs the
//! session loop against the configured target until Ctrl-C.
//!
//! In `test_mode` a server dispatch loop is spawned in-process on the target
//! address, so a single binary demonstrates the full exchange.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use mesh_core::{
    DispatchConfig, DispatchLoop, InboundHandler, IntervalTicker, LoopbackTransport, Scanner,
    SessionLoop,
};

use mesh_client::cli::CommandLine;
use mesh_client::config::{default_config_path, load_config};
use mesh_client::identity::local_identity;
use mesh_client::progress::LogProgress;

/// Handler used by the in-process server of test mode.
struct EchoHandler;

impl InboundHandler for EchoHandler {
    fn handle_message(&self, message: &str) {
        info!(%message, "test-mode server received message");
    }
}

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
        "MeshDiag client starting"
    );

    let transport = Arc::new(LoopbackTransport::new());
    transport.register_node(
        config.node.address,
        Some(local_identity(&config.node.hostname)),
    );

    // Shutdown flag shared across all loops.
    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── In-process server (test mode) ─────────────────────────────────────────
    if config.session.test_mode {
        transport.register_node(config.session.target, None);
        let mut dispatch = DispatchLoop::new(
            transport.clone(),
            DispatchConfig {
                service_port: config.session.port,
                ..DispatchConfig::default()
            },
            Arc::new(EchoHandler),
        );
        let socket = dispatch.bind();
        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            dispatch.run(&socket, &running_clone).await;
        });
        info!(
            address = config.session.target,
            "test mode: in-process server started"
        );
    }

    // ── Scan ──────────────────────────────────────────────────────────────────
    let scanner = Scanner::new(transport.clone(), config.scan_config());
    let report = scanner.run(&LogProgress).await;
    if report.is_empty() {
        info!("no nodes answered the scan");
    }

    // ── Session loop ──────────────────────────────────────────────────────────
    let period = if config.session.test_mode {
        Duration::from_millis(200)
    } else {
        Duration::from_millis(1000)
    };
    let ticker = IntervalTicker::new(period);
    let mut session = SessionLoop::new(transport.clone(), config.session_config());
    session.run(&running, &ticker).await;

    info!(sessions = session.sessions(), "MeshDiag client stopped");
    Ok(())
}
