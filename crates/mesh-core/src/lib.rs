//! # mesh-core
//!
//! Shared library for MeshDiag containing the transport facade, the node
//! scanner, and the client/server exchange loops.
//!
//! MeshDiag is a diagnostic harness for a small packet-switched,
//! address-routed network: it discovers reachable nodes by sweeping an
//! address range with liveness probes, and demonstrates a connection-oriented
//! request/response exchange between a client role and a server role.
//!
//! This crate defines:
//!
//! - **`domain`** – addresses, ports, packet buffers, node identity records,
//!   and scan reports.  Pure data, no I/O.
//!
//! - **`transport`** – the [`Transport`] facade the loops call into
//!   (probe/identify/connect/send/accept/read/…), plus an in-memory
//!   [`LoopbackTransport`] used by tests and by the binaries' demo wiring.
//!   The real routing stack (interface drivers, checksums, retransmission)
//!   lives behind this trait and is not implemented here.
//!
//! - **`scanner`** – bounded-time sweep of an address range, collecting
//!   identity metadata for every node that answers.
//!
//! - **`session`** – the client role: one ping + reboot + greeting exchange
//!   per iteration against a fixed target.
//!
//! - **`dispatch`** – the server role: accept loop, per-connection packet
//!   reads, and port-based routing to the application handler or the
//!   protocol's default service handler.
//!
//! - **`clock`** – the [`Ticker`] abstraction that schedules session
//!   iterations, injectable so tests run without wall-clock waits.

pub mod clock;
pub mod dispatch;
pub mod domain;
pub mod scanner;
pub mod session;
pub mod transport;

// Re-export the most-used types at the crate root so callers can write
// `mesh_core::Transport` instead of `mesh_core::transport::Transport`.
pub use clock::{IntervalTicker, Ticker};
pub use dispatch::{DispatchConfig, DispatchLoop, InboundHandler, RecordingHandler};
pub use domain::node::{Address, NodeIdentity, Port, ScanRecord, ScanReport};
pub use domain::packet::{Delivery, Packet, Priority};
pub use scanner::{ScanConfig, Scanner, ScanProgress};
pub use session::{SessionConfig, SessionLoop, SessionOutcome};
pub use transport::loopback::{LoopbackStats, LoopbackTransport};
pub use transport::{Connection, PortSelector, Socket, Transport};
