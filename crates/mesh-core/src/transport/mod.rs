//! The transport facade the diagnostic loops call into.
//!
//! The underlying routing stack (address resolution, interface drivers,
//! checksums, retransmission) is an external collaborator.  This module
//! defines only the seam: an async trait whose suspension points are exactly
//! the timeout-bounded calls (`probe`, `identify`, `connect`, `accept`,
//! `read`).  Every timeout is a local, per-call contract: the call returns
//! `None` on expiry rather than raising an error, and never retries on its
//! own; retry belongs to the enclosing loop's next iteration.
//!
//! [`LoopbackTransport`](loopback::LoopbackTransport) is the in-process
//! implementation used by tests and by the binaries' demo wiring.

pub mod loopback;

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::node::{Address, NodeIdentity, Port};
use crate::domain::packet::{Delivery, Packet, Priority};

/// A stateful channel to one `(remote address, remote port)` endpoint.
///
/// Owned exclusively by whichever loop created (or accepted) it, and
/// released exactly once by passing it to [`Transport::close`]: the handle
/// is consumed there, so a second close does not compile.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    peer: Address,
    dport: Port,
}

impl Connection {
    /// Creates a handle.  Only transport implementations should call this.
    pub fn new(id: u64, peer: Address, dport: Port) -> Self {
        Self { id, peer, dport }
    }

    /// Transport-internal identifier for this connection.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Address of the remote node.
    pub fn peer(&self) -> Address {
        self.peer
    }

    /// Destination port of the packets flowing over this connection.
    pub fn dport(&self) -> Port {
        self.dport
    }
}

/// A passive listening endpoint.  Lifetime spans the whole server run.
#[derive(Debug)]
pub struct Socket {
    id: u64,
}

impl Socket {
    /// Creates a handle.  Only transport implementations should call this.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// Transport-internal identifier for this socket.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Which destination ports a listening socket claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSelector {
    /// All inbound connections, regardless of port.
    Any,
    /// Only connections targeting one specific port.
    Port(Port),
}

impl PortSelector {
    /// Returns `true` when this selector claims `port`.
    pub fn matches(&self, port: Port) -> bool {
        match self {
            PortSelector::Any => true,
            PortSelector::Port(p) => *p == port,
        }
    }
}

/// The primitives the scanner and the exchange loops consume.
///
/// All timeout-bounded operations return `Option`: `None` means "timed out /
/// not available", which for this harness is an expected outcome, never an
/// error.  Buffer ownership moves into `send` and `default_service_handler`;
/// a receiver that processed a packet itself returns it via
/// `release_packet`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a liveness probe with a `payload_len`-byte payload and returns
    /// the round-trip time, or `None` when no answer arrived within
    /// `timeout`.
    async fn probe(
        &self,
        address: Address,
        timeout: Duration,
        payload_len: usize,
        delivery: Delivery,
    ) -> Option<Duration>;

    /// Queries a node for its identity record.
    async fn identify(&self, address: Address, timeout: Duration) -> Option<NodeIdentity>;

    /// Opens a connection to `(address, port)`.  `None` means setup failed
    /// or timed out.
    async fn connect(
        &self,
        priority: Priority,
        address: Address,
        port: Port,
        timeout: Duration,
        delivery: Delivery,
    ) -> Option<Connection>;

    /// Takes a buffer from the shared pool.  `None` means the pool is
    /// exhausted.
    fn acquire_packet(&self, capacity: usize) -> Option<Packet>;

    /// Sends `packet` on `conn`.  Ownership of the buffer transfers to the
    /// transport, which closes it out regardless of network-level success;
    /// the caller must not reuse or release it afterward.
    async fn send(&self, conn: &Connection, packet: Packet);

    /// Releases the connection.  Consumes the handle.
    async fn close(&self, conn: Connection);

    /// Returns a buffer the receiver has finished with to the pool.
    fn release_packet(&self, packet: Packet);

    /// Binds a listening socket to the ports `selector` claims.
    fn bind(&self, selector: PortSelector) -> Socket;

    /// Allows up to `backlog` pending, unaccepted connections on `socket`.
    fn listen(&self, socket: &Socket, backlog: usize);

    /// Waits up to `timeout` for an inbound connection.  `None` is the
    /// expected idle outcome, not an error.
    async fn accept(&self, socket: &Socket, timeout: Duration) -> Option<Connection>;

    /// Reads the next packet on `conn`.  `None` signals end-of-stream-for-now
    /// (timeout or peer close), not necessarily connection death.
    async fn read(&self, conn: &Connection, timeout: Duration) -> Option<Packet>;

    /// Hands a packet to the protocol's built-in diagnostic services
    /// (ping replies, buffer-usage queries, …).  Consumes and releases the
    /// buffer.
    async fn default_service_handler(&self, packet: Packet);

    /// Which destination port the connection's inbound packets target.
    fn destination_port(&self, conn: &Connection) -> Port;

    /// Fire-and-forget administrative reboot request.  No acknowledgement is
    /// expected or waited for.
    async fn reboot(&self, address: Address);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
