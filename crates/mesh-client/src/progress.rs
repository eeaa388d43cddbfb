//! Operator-facing scan output.
//!
//! One log line per event, so a scan of a quiet network reads as a short
//! banner followed by the summary, and a populated network lists every node
//! found with its round-trip time and identity.

use std::time::Duration;

use tracing::info;

use mesh_core::{Address, NodeIdentity, ScanProgress};

/// Logs scan progress through `tracing`.
pub struct LogProgress;

impl ScanProgress for LogProgress {
    fn begin(&self, begin: Address, end: Address) {
        info!(begin, end, "scanning address range");
    }

    fn probing(&self, address: Address) {
        info!(address, "probing");
    }

    fn found(&self, address: Address, rtt: Duration) {
        info!(address, ?rtt, "node answered");
    }

    fn identified(&self, address: Address, identity: &NodeIdentity) {
        info!(
            address,
            hostname = %identity.hostname,
            model = %identity.model,
            revision = %identity.revision,
            "node identified"
        );
    }

    fn finished(&self, probes_issued: usize) {
        info!(probes_issued, "scan finished");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tracing::span;

    use super::*;
    use mesh_core::NodeIdentity;

    /// Counts every emitted event, so the tests can assert that each scan
    /// callback produces exactly one log line.
    #[derive(Default)]
    struct EventCounter {
        events: Arc<AtomicUsize>,
    }

    impl tracing::Subscriber for EventCounter {
        fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _span: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }
        fn record(&self, _span: &span::Id, _values: &span::Record<'_>) {}
        fn record_follows_from(&self, _span: &span::Id, _follows: &span::Id) {}
        fn event(&self, _event: &tracing::Event<'_>) {
            self.events.fetch_add(1, Ordering::Relaxed);
        }
        fn enter(&self, _span: &span::Id) {}
        fn exit(&self, _span: &span::Id) {}
    }

    fn count_events(run: impl FnOnce()) -> usize {
        let events = Arc::new(AtomicUsize::new(0));
        let counter = EventCounter {
            events: Arc::clone(&events),
        };
        tracing::subscriber::with_default(counter, run);
        events.load(Ordering::Relaxed)
    }

    #[test]
    fn test_probing_logs_one_line_per_address() {
        // Arrange / Act
        let emitted = count_events(|| {
            let progress = LogProgress;
            progress.probing(0);
            progress.probing(1);
            progress.probing(2);
        });

        // Assert
        assert_eq!(emitted, 3);
    }

    #[test]
    fn test_every_callback_emits_a_line() {
        let identity = NodeIdentity {
            hostname: "node-3".to_string(),
            model: "testbed".to_string(),
            revision: "0.1.0".to_string(),
            date: "2026-08-27".to_string(),
            time: "12:00:00".to_string(),
        };

        let emitted = count_events(|| {
            let progress = LogProgress;
            progress.begin(0, 16);
            progress.probing(3);
            progress.found(3, Duration::from_micros(150));
            progress.identified(3, &identity);
            progress.finished(17);
        });

        assert_eq!(emitted, 5);
    }
}
