//! The server's application handler: log every message received on the
//! service port.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use mesh_core::InboundHandler;

/// Logs each service-port message with a running count.
#[derive(Default)]
pub struct LogHandler {
    count: AtomicU64,
}

impl LogHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages handled so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl InboundHandler for LogHandler {
    fn handle_message(&self, message: &str) {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        info!(%message, count = n, "message received");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_handler_counts_messages() {
        // Arrange
        let handler = LogHandler::new();

        // Act
        handler.handle_message("Hello world A");
        handler.handle_message("Hello world B");

        // Assert
        assert_eq!(handler.count(), 2);
    }
}
