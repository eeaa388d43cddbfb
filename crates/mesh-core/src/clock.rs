//! Scheduling seam for the session loop.
//!
//! The loop never calls a sleep primitive directly; it waits on an injected
//! [`Ticker`], so tests can drive iterations without wall-clock delays.

use std::time::Duration;

use async_trait::async_trait;

/// Separates session iterations.
#[async_trait]
pub trait Ticker: Send + Sync {
    /// Waits until the next iteration should start.
    async fn wait(&self);
}

/// Real-time ticker: each wait sleeps for a fixed period.
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// The configured inter-iteration period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn wait(&self) {
        tokio::time::sleep(self.period).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
