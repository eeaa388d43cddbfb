//! In-memory loopback transport.
//!
//! Stands in for the real routing stack when both roles live in one process,
//! which is exactly how the harness verifies that client and server can
//! exchange packets.  It also doubles as the recording test double for the
//! loops: every probe, send, accept, and close is tallied in
//! [`LoopbackStats`].
//!
//! Behavioural notes:
//!
//! - Probes and identification queries answer immediately for registered
//!   nodes and return `None` immediately for unknown addresses; a real
//!   transport would block up to the caller's timeout instead.  Either way
//!   the caller's timeout bound holds.
//! - Connections are a pair of bounded in-memory queues.  Closing one side
//!   drops its sender, so the peer's next `read` returns `None` once the
//!   queue drains.  That is the "peer stopped sending" signal the dispatch
//!   loop relies on.
//! - The packet pool is a simple credit counter: `acquire_packet` takes a
//!   credit, `send` returns it when delivery fails, and `release_packet` /
//!   `default_service_handler` return it after processing.
//! - Source addressing is not modelled: accepted connection handles report
//!   peer address 0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time;
use tracing::debug;

use crate::domain::node::{Address, NodeIdentity, Port};
use crate::domain::packet::{Delivery, Packet, Priority};
use crate::transport::{Connection, PortSelector, Socket, Transport};

/// Round-trip time reported for every successful loopback probe.
const PROBE_RTT: Duration = Duration::from_micros(150);

/// Per-connection queue depth, in packets.
const QUEUE_DEPTH: usize = 16;

/// Default number of packet buffers in the pool.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Call tallies recorded by the loopback transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Every probed address, in call order.
    pub probes: Vec<Address>,
    /// Every identified address, in call order.
    pub identifies: Vec<Address>,
    /// Successful connection setups.
    pub connects: u64,
    /// Send calls (delivered or not).
    pub sends: u64,
    /// Connection handles released.
    pub closes: u64,
    /// Connections handed out by `accept`.
    pub accepts: u64,
    /// Reboot requests issued.
    pub reboots: u64,
    /// Packets consumed by the default service handler.
    pub default_handled: u64,
    /// Live connection endpoints (two per open connection).
    pub open_endpoints: usize,
}

/// One side of a connection: where our packets go, and where the peer's
/// packets arrive.
struct Endpoint {
    tx_to_peer: mpsc::Sender<Packet>,
    rx: AsyncMutex<mpsc::Receiver<Packet>>,
}

struct ListenerEntry {
    socket_id: u64,
    selector: PortSelector,
    // Populated by `listen`; a bound but not yet listening socket
    // refuses connections.
    queue_tx: Option<mpsc::Sender<Connection>>,
    queue_rx: Option<Arc<AsyncMutex<mpsc::Receiver<Connection>>>>,
}

#[derive(Default)]
struct Tallies {
    probes: Vec<Address>,
    identifies: Vec<Address>,
    connects: u64,
    sends: u64,
    closes: u64,
    accepts: u64,
    reboots: u64,
    default_handled: u64,
}

struct Inner {
    nodes: HashMap<Address, Option<NodeIdentity>>,
    listeners: Vec<ListenerEntry>,
    endpoints: HashMap<u64, Arc<Endpoint>>,
    next_id: u64,
    pool_free: usize,
    tallies: Tallies,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// The in-process transport.  Shared between roles via `Arc`.
pub struct LoopbackTransport {
    inner: Mutex<Inner>,
}

impl LoopbackTransport {
    /// Creates a transport with the default packet pool size.
    pub fn new() -> Self {
        Self::with_packet_pool(DEFAULT_POOL_SIZE)
    }

    /// Creates a transport with `pool_size` packet buffers.  A size of zero
    /// makes every `acquire_packet` fail, which is how the buffer-exhaustion
    /// paths are tested.
    pub fn with_packet_pool(pool_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                nodes: HashMap::new(),
                listeners: Vec::new(),
                endpoints: HashMap::new(),
                next_id: 0,
                pool_free: pool_size,
                tallies: Tallies::default(),
            }),
        }
    }

    /// Registers a node at `address`.  Probes answer for registered nodes;
    /// identification queries answer only when an identity was supplied.
    pub fn register_node(&self, address: Address, identity: Option<NodeIdentity>) {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.insert(address, identity);
    }

    /// Snapshot of the recorded call tallies.
    pub fn stats(&self) -> LoopbackStats {
        let inner = self.inner.lock().unwrap();
        LoopbackStats {
            probes: inner.tallies.probes.clone(),
            identifies: inner.tallies.identifies.clone(),
            connects: inner.tallies.connects,
            sends: inner.tallies.sends,
            closes: inner.tallies.closes,
            accepts: inner.tallies.accepts,
            reboots: inner.tallies.reboots,
            default_handled: inner.tallies.default_handled,
            open_endpoints: inner.endpoints.len(),
        }
    }

    /// Free buffers currently in the pool.
    pub fn pool_free(&self) -> usize {
        self.inner.lock().unwrap().pool_free
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn probe(
        &self,
        address: Address,
        _timeout: Duration,
        _payload_len: usize,
        _delivery: Delivery,
    ) -> Option<Duration> {
        let mut inner = self.inner.lock().unwrap();
        inner.tallies.probes.push(address);
        if inner.nodes.contains_key(&address) {
            Some(PROBE_RTT)
        } else {
            None
        }
    }

    async fn identify(&self, address: Address, _timeout: Duration) -> Option<NodeIdentity> {
        let mut inner = self.inner.lock().unwrap();
        inner.tallies.identifies.push(address);
        inner.nodes.get(&address).cloned().flatten()
    }

    async fn connect(
        &self,
        _priority: Priority,
        address: Address,
        port: Port,
        _timeout: Duration,
        _delivery: Delivery,
    ) -> Option<Connection> {
        let (client_id, server_id, server_conn, queue_tx) = {
            let mut inner = self.inner.lock().unwrap();
            if !inner.nodes.contains_key(&address) {
                return None;
            }
            let queue_tx = inner
                .listeners
                .iter()
                .find(|l| l.selector.matches(port))
                .and_then(|l| l.queue_tx.clone())?;

            let client_id = inner.next_id();
            let server_id = inner.next_id();
            let (c2s_tx, c2s_rx) = mpsc::channel(QUEUE_DEPTH);
            let (s2c_tx, s2c_rx) = mpsc::channel(QUEUE_DEPTH);
            inner.endpoints.insert(
                client_id,
                Arc::new(Endpoint {
                    tx_to_peer: c2s_tx,
                    rx: AsyncMutex::new(s2c_rx),
                }),
            );
            inner.endpoints.insert(
                server_id,
                Arc::new(Endpoint {
                    tx_to_peer: s2c_tx,
                    rx: AsyncMutex::new(c2s_rx),
                }),
            );
            (
                client_id,
                server_id,
                Connection::new(server_id, 0, port),
                queue_tx,
            )
        };

        match queue_tx.try_send(server_conn) {
            Ok(()) => {
                let mut inner = self.inner.lock().unwrap();
                inner.tallies.connects += 1;
                Some(Connection::new(client_id, address, port))
            }
            Err(_) => {
                // Backlog full (or listener gone): tear the half-built
                // connection back down.
                let mut inner = self.inner.lock().unwrap();
                inner.endpoints.remove(&client_id);
                inner.endpoints.remove(&server_id);
                None
            }
        }
    }

    fn acquire_packet(&self, capacity: usize) -> Option<Packet> {
        let mut inner = self.inner.lock().unwrap();
        if inner.pool_free == 0 {
            return None;
        }
        inner.pool_free -= 1;
        Some(Packet::new(capacity))
    }

    async fn send(&self, conn: &Connection, mut packet: Packet) {
        packet.set_dport(conn.dport());
        let endpoint = {
            let inner = self.inner.lock().unwrap();
            inner.endpoints.get(&conn.id()).cloned()
        };

        let delivered = match endpoint {
            Some(endpoint) => endpoint.tx_to_peer.try_send(packet).is_ok(),
            None => false,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.tallies.sends += 1;
        if !delivered {
            // The buffer was closed out here instead of by a receiver.
            inner.pool_free += 1;
        }
    }

    async fn close(&self, conn: Connection) {
        let endpoint = {
            let mut inner = self.inner.lock().unwrap();
            inner.tallies.closes += 1;
            inner.endpoints.remove(&conn.id())
        };

        // Packets delivered to this side but never read die with the
        // connection; their pool credits come back here.  Each side drains
        // its own inbox, which covers both directions.
        if let Some(endpoint) = endpoint {
            let mut rx = endpoint.rx.lock().await;
            let mut reclaimed = 0;
            while rx.try_recv().is_ok() {
                reclaimed += 1;
            }
            if reclaimed > 0 {
                self.inner.lock().unwrap().pool_free += reclaimed;
            }
        }
    }

    fn release_packet(&self, _packet: Packet) {
        let mut inner = self.inner.lock().unwrap();
        inner.pool_free += 1;
    }

    fn bind(&self, selector: PortSelector) -> Socket {
        let mut inner = self.inner.lock().unwrap();
        let socket_id = inner.next_id();
        inner.listeners.push(ListenerEntry {
            socket_id,
            selector,
            queue_tx: None,
            queue_rx: None,
        });
        Socket::new(socket_id)
    }

    fn listen(&self, socket: &Socket, backlog: usize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(listener) = inner
            .listeners
            .iter_mut()
            .find(|l| l.socket_id == socket.id())
        {
            let (tx, rx) = mpsc::channel(backlog.max(1));
            listener.queue_tx = Some(tx);
            listener.queue_rx = Some(Arc::new(AsyncMutex::new(rx)));
        }
    }

    async fn accept(&self, socket: &Socket, timeout: Duration) -> Option<Connection> {
        let queue = {
            let inner = self.inner.lock().unwrap();
            inner
                .listeners
                .iter()
                .find(|l| l.socket_id == socket.id())
                .and_then(|l| l.queue_rx.clone())
        }?;

        let mut queue = queue.lock().await;
        match time::timeout(timeout, queue.recv()).await {
            Ok(Some(conn)) => {
                self.inner.lock().unwrap().tallies.accepts += 1;
                Some(conn)
            }
            // Channel closed or timeout: either way, nothing to accept.
            _ => None,
        }
    }

    async fn read(&self, conn: &Connection, timeout: Duration) -> Option<Packet> {
        let endpoint = {
            let inner = self.inner.lock().unwrap();
            inner.endpoints.get(&conn.id()).cloned()
        }?;

        let mut rx = endpoint.rx.lock().await;
        match time::timeout(timeout, rx.recv()).await {
            Ok(Some(packet)) => Some(packet),
            // `Ok(None)` is peer close, `Err` is timeout; the dispatch loop
            // treats both as end-of-stream-for-now.
            _ => None,
        }
    }

    async fn default_service_handler(&self, packet: Packet) {
        debug!(port = packet.dport(), "default service handler consumed packet");
        let mut inner = self.inner.lock().unwrap();
        inner.tallies.default_handled += 1;
        inner.pool_free += 1;
    }

    fn destination_port(&self, conn: &Connection) -> Port {
        conn.dport()
    }

    async fn reboot(&self, address: Address) {
        debug!(address, "reboot request sent");
        let mut inner = self.inner.lock().unwrap();
        inner.tallies.reboots += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
