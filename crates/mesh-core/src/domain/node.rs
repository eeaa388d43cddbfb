//! Node addressing, identity records, and scan reports.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Routing identifier for a node in the network.
///
/// The address space is small and bounded; deployments default to `0..=16`.
/// Distinct from any wire-level transport address, which belongs to the
/// routing stack behind the transport facade.
pub type Address = u8;

/// Endpoint identifier within a node, used to select which handler receives
/// a packet.
pub type Port = u8;

/// First address probed by a default scan.
pub const DEFAULT_SCAN_BEGIN: Address = 0;

/// Last address probed by a default scan (inclusive).
pub const DEFAULT_SCAN_END: Address = 16;

/// Descriptive metadata returned by an identification query against a
/// reachable node.
///
/// Ephemeral: records are scoped to one scan iteration and never persisted
/// by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Hostname the node was configured with.
    pub hostname: String,
    /// Hardware or software model string.
    pub model: String,
    /// Revision string (typically a version number).
    pub revision: String,
    /// Build date string.
    pub date: String,
    /// Build time string.
    pub time: String,
}

/// A single reachable node found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// The address that answered the liveness probe.
    pub address: Address,
    /// Probe round-trip time.
    pub rtt: Duration,
    /// Identity metadata, when the follow-up identification query succeeded.
    /// A node that answers the probe but not the query is still recorded.
    pub identity: Option<NodeIdentity>,
}

/// The outcome of one scan: every address that answered, in ascending order,
/// plus the number of probes issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Reachable nodes, in ascending address order.
    pub records: Vec<ScanRecord>,
    /// Total probes issued (always `end - begin + 1` for a completed scan).
    pub probes_issued: usize,
}

impl ScanReport {
    /// Returns `true` when no node answered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The addresses that answered, in ascending order.
    pub fn addresses(&self) -> Vec<Address> {
        self.records.iter().map(|r| r.address).collect()
    }

    /// Looks up the record for `address`, if it answered.
    pub fn record(&self, address: Address) -> Option<&ScanRecord> {
        self.records.iter().find(|r| r.address == address)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
