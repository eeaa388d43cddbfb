//! Node discovery: sweep an address range with liveness probes.
//!
//! The scan is strictly sequential and ascending (downstream consumers rely
//! on ascending address order for display) and bounded in time: the caller
//! never waits longer than `(end - begin + 1) * probe_timeout` plus the
//! identification timeouts of the nodes that answered.  A scan never fails;
//! unreachable addresses are the expected majority outcome and are skipped
//! silently.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::node::{
    Address, NodeIdentity, ScanRecord, ScanReport, DEFAULT_SCAN_BEGIN, DEFAULT_SCAN_END,
};
use crate::domain::packet::Delivery;
use crate::transport::Transport;

/// Scan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// First address to probe.
    pub begin: Address,
    /// Last address to probe (inclusive).
    pub end: Address,
    /// Per-probe timeout.  Probes carry a zero-length payload.
    pub probe_timeout: Duration,
    /// Timeout for the identification query that follows a successful probe.
    pub identify_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            begin: DEFAULT_SCAN_BEGIN,
            end: DEFAULT_SCAN_END,
            probe_timeout: Duration::from_millis(20),
            identify_timeout: Duration::from_millis(100),
        }
    }
}

/// Incremental progress callbacks, one notification per address, so an
/// operator can watch long scans.  All methods default to no-ops.
pub trait ScanProgress: Send + Sync {
    /// The scan is starting over `begin..=end`.
    fn begin(&self, _begin: Address, _end: Address) {}
    /// `address` is about to be probed.
    fn probing(&self, _address: Address) {}
    /// `address` answered the liveness probe.
    fn found(&self, _address: Address, _rtt: Duration) {}
    /// `address` also answered the identification query.
    fn identified(&self, _address: Address, _identity: &NodeIdentity) {}
    /// The scan finished after `probes_issued` probes.
    fn finished(&self, _probes_issued: usize) {}
}

/// Progress sink that ignores every notification.
pub struct NullProgress;

impl ScanProgress for NullProgress {}

/// Sweeps an address range and collects identity metadata for responsive
/// nodes.
pub struct Scanner {
    transport: Arc<dyn Transport>,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(transport: Arc<dyn Transport>, config: ScanConfig) -> Self {
        Self { transport, config }
    }

    /// Runs one scan.
    ///
    /// Issues exactly `end - begin + 1` probes in ascending order.  A failed
    /// probe is silently skipped; a failed identification query after a
    /// successful probe is logged and the address is still recorded as
    /// reachable, without identity.  This function never fails.
    pub async fn run(&self, progress: &dyn ScanProgress) -> ScanReport {
        let ScanConfig {
            begin,
            end,
            probe_timeout,
            identify_timeout,
        } = self.config;

        progress.begin(begin, end);

        let mut report = ScanReport::default();
        for address in begin..=end {
            progress.probing(address);
            report.probes_issued += 1;

            let Some(rtt) = self
                .transport
                .probe(address, probe_timeout, 0, Delivery::Checked)
                .await
            else {
                continue;
            };
            progress.found(address, rtt);

            let identity = self.transport.identify(address, identify_timeout).await;
            match &identity {
                Some(identity) => progress.identified(address, identity),
                None => warn!(address, "node answered probe but not identification"),
            }

            report.records.push(ScanRecord {
                address,
                rtt,
                identity,
            });
        }

        progress.finished(report.probes_issued);
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate;

    use super::*;
    use crate::transport::loopback::LoopbackTransport;
    use crate::transport::MockTransport;

    fn identity(hostname: &str) -> NodeIdentity {
        NodeIdentity {
            hostname: hostname.to_string(),
            model: "testbed".to_string(),
            revision: "0.1.0".to_string(),
            date: "2026-08-27".to_string(),
            time: "12:00:00".to_string(),
        }
    }

    fn config(begin: Address, end: Address) -> ScanConfig {
        ScanConfig {
            begin,
            end,
            ..ScanConfig::default()
        }
    }

    /// Records the order of progress callbacks.
    #[derive(Default)]
    struct RecordingProgress {
        probed: Mutex<Vec<Address>>,
        found: Mutex<Vec<Address>>,
    }

    impl ScanProgress for RecordingProgress {
        fn probing(&self, address: Address) {
            self.probed.lock().unwrap().push(address);
        }

        fn found(&self, address: Address, _rtt: Duration) {
            self.found.lock().unwrap().push(address);
        }
    }

    #[tokio::test]
    async fn test_scan_probes_every_address_in_ascending_order() {
        // Arrange: nodes at 3 and 9, range 0..=16.
        let transport = Arc::new(LoopbackTransport::new());
        transport.register_node(3, Some(identity("node-3")));
        transport.register_node(9, None);
        let scanner = Scanner::new(transport.clone(), config(0, 16));
        let progress = RecordingProgress::default();

        // Act
        let report = scanner.run(&progress).await;

        // Assert: exactly end - begin + 1 probes, ascending, no gaps.
        let expected: Vec<Address> = (0..=16).collect();
        assert_eq!(transport.stats().probes, expected);
        assert_eq!(report.probes_issued, 17);
        assert_eq!(*progress.probed.lock().unwrap(), expected);
        assert_eq!(report.addresses(), vec![3, 9]);
    }

    #[tokio::test]
    async fn test_scan_never_probes_outside_the_range() {
        // Arrange: strict mock; any probe outside 4..=6 fails the test
        // because it has no matching expectation.
        let mut mock = MockTransport::new();
        mock.expect_probe()
            .with(
                predicate::in_iter(vec![4u8, 5, 6]),
                predicate::always(),
                predicate::eq(0usize),
                predicate::eq(Delivery::Checked),
            )
            .times(3)
            .returning(|_, _, _, _| None);

        let scanner = Scanner::new(Arc::new(mock), config(4, 6));

        // Act
        let report = scanner.run(&NullProgress).await;

        // Assert
        assert_eq!(report.probes_issued, 3);
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_identify_failure_keeps_address_reachable_without_identity() {
        // Arrange: node 5 answers probes but not identification queries.
        let transport = Arc::new(LoopbackTransport::new());
        transport.register_node(5, None);
        let scanner = Scanner::new(transport.clone(), config(5, 5));

        // Act
        let report = scanner.run(&NullProgress).await;

        // Assert
        let record = report.record(5).expect("address 5 must be recorded");
        assert!(record.identity.is_none());
        assert_eq!(transport.stats().identifies, vec![5]);
    }

    #[tokio::test]
    async fn test_probe_then_identify_round_trips_hostname() {
        // Arrange
        let transport = Arc::new(LoopbackTransport::new());
        transport.register_node(2, Some(identity("flight-computer")));
        let scanner = Scanner::new(transport, config(0, 4));

        // Act
        let report = scanner.run(&NullProgress).await;

        // Assert: the identity attached to the record is the node's own.
        let record = report.record(2).expect("address 2 must be recorded");
        assert_eq!(
            record.identity.as_ref().map(|i| i.hostname.as_str()),
            Some("flight-computer")
        );
    }

    #[tokio::test]
    async fn test_scan_with_no_nodes_completes_with_empty_report() {
        let transport = Arc::new(LoopbackTransport::new());
        let scanner = Scanner::new(transport.clone(), config(0, 16));

        let report = scanner.run(&NullProgress).await;

        assert!(report.is_empty());
        assert_eq!(report.probes_issued, 17);
        // No identification queries were issued for silent addresses.
        assert!(transport.stats().identifies.is_empty());
    }

    #[tokio::test]
    async fn test_single_address_range_issues_one_probe() {
        let transport = Arc::new(LoopbackTransport::new());
        let scanner = Scanner::new(transport.clone(), config(7, 7));

        let report = scanner.run(&NullProgress).await;

        assert_eq!(report.probes_issued, 1);
        assert_eq!(transport.stats().probes, vec![7]);
    }
}
