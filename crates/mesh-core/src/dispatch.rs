//! The server role: accept connections and route their packets by port.
//!
//! One connection is served to completion before the next is accepted.
//! Packets whose connection targets the configured service port go to the
//! application's [`InboundHandler`]; everything else is delegated to the
//! protocol's default service handler, which answers built-in diagnostic
//! requests and owns the buffer from that point on.
//!
//! Per-connection failures such as a read timeout or the peer going quiet
//! are normal termination, never errors: the connection is closed exactly
//! once and the loop returns to accepting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use crate::domain::node::Port;
use crate::transport::{Connection, PortSelector, Socket, Transport};

/// Dispatch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Port whose packets are delivered to the application handler.
    pub service_port: Port,
    /// Pending-connection capacity of the listening socket.
    pub backlog: usize,
    /// How long one accept call waits for an inbound connection.
    pub accept_timeout: Duration,
    /// How long one read call waits for the next packet.
    pub read_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            service_port: 10,
            backlog: 10,
            accept_timeout: Duration::from_millis(10_000),
            read_timeout: Duration::from_millis(50),
        }
    }
}

/// Application-side consumer of service-port payloads.
pub trait InboundHandler: Send + Sync {
    /// Called once per packet received on the service port, with the payload
    /// interpreted as text.
    fn handle_message(&self, message: &str);
}

/// Handler that stores every delivered message; the test double for the
/// routing logic.
#[derive(Default)]
pub struct RecordingHandler {
    messages: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl InboundHandler for RecordingHandler {
    fn handle_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// The server dispatch loop.  Owns the received-message tally.
pub struct DispatchLoop {
    transport: Arc<dyn Transport>,
    config: DispatchConfig,
    handler: Arc<dyn InboundHandler>,
    received: u64,
}

impl DispatchLoop {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: DispatchConfig,
        handler: Arc<dyn InboundHandler>,
    ) -> Self {
        Self {
            transport,
            config,
            handler,
            received: 0,
        }
    }

    /// Packets delivered to the application handler so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Binds the listening socket to all ports with the configured backlog.
    /// The socket's lifetime spans the whole server run.
    pub fn bind(&self) -> Socket {
        let socket = self.transport.bind(PortSelector::Any);
        self.transport.listen(&socket, self.config.backlog);
        socket
    }

    /// Reads packets on `conn` until the stream goes quiet, routing each by
    /// the connection's destination port, then closes the connection.
    pub async fn serve_connection(&mut self, conn: Connection) {
        info!("connection opened");

        while let Some(packet) = self.transport.read(&conn, self.config.read_timeout).await {
            if self.transport.destination_port(&conn) == self.config.service_port {
                let message = packet.text();
                info!(%message, "packet received on service port");
                self.handler.handle_message(&message);
                self.transport.release_packet(packet);
                self.received += 1;
            } else {
                // Built-in request (ping, buffer usage, …): the default
                // handler takes buffer ownership.
                self.transport.default_service_handler(packet).await;
            }
        }

        self.transport.close(conn).await;
        info!("connection closed");
    }

    /// Serves forever: accept, serve to completion, re-accept.  An accept
    /// timeout is the expected idle state.  Exits only when `running` is
    /// cleared.
    pub async fn run(&mut self, socket: &Socket, running: &AtomicBool) {
        info!("server dispatch loop started");
        while running.load(Ordering::Relaxed) {
            let Some(conn) = self
                .transport
                .accept(socket, self.config.accept_timeout)
                .await
            else {
                continue;
            };
            self.serve_connection(conn).await;
        }
        info!("server dispatch loop stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
