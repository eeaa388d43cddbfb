//! Packet buffers and per-connection options.

use crate::domain::node::Port;

/// Connection priority, highest first.
///
/// Sessions in this harness use [`Priority::Norm`]; the other levels exist
/// so the facade contract matches what a routing stack offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Norm = 2,
    Low = 3,
}

/// Delivery semantics requested for a probe or connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No delivery guarantees beyond the routing layer's defaults.
    BestEffort,
    /// Integrity-checked delivery (checksummed end to end).
    Checked,
}

/// An owned packet buffer plus its destination port.
///
/// Packets are acquired from the transport's shared pool
/// ([`crate::Transport::acquire_packet`]) and then either consumed by a send
/// operation or released by the receiver, never both.  Rust move semantics
/// enforce the exactly-once rule: `send` and `default_service_handler` take
/// the packet by value, and a receiver that keeps it must hand it back to
/// [`crate::Transport::release_packet`].
#[derive(Debug)]
pub struct Packet {
    dport: Port,
    data: Vec<u8>,
    capacity: usize,
}

impl Packet {
    /// Creates an empty packet able to carry up to `capacity` payload bytes.
    ///
    /// Transport implementations call this from `acquire_packet`; the loops
    /// never construct packets directly.
    pub fn new(capacity: usize) -> Self {
        Self {
            dport: 0,
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The port this packet targets.  Stamped by the transport on send from
    /// the connection's destination port.
    pub fn dport(&self) -> Port {
        self.dport
    }

    pub(crate) fn set_dport(&mut self, dport: Port) {
        self.dport = dport;
    }

    /// Replaces the payload, truncating to the buffer capacity.
    pub fn set_payload(&mut self, bytes: &[u8]) {
        let take = bytes.len().min(self.capacity);
        self.data.clear();
        self.data.extend_from_slice(&bytes[..take]);
    }

    /// The payload bytes, including any terminator the sender wrote.
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when no payload has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum payload this buffer can carry.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Interprets the payload as text, stopping at the first NUL byte.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; a misbehaving peer
    /// must not be able to break the dispatch loop.
    pub fn text(&self) -> String {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
