//! The client role: one diagnostic session per iteration against a fixed
//! target.
//!
//! Each session pings the target, fires a best-effort reboot notification,
//! and then performs the connection-oriented greeting exchange.  None of the
//! per-operation failures escape the iteration: ping timeouts are only
//! reported, and setup failures abort the current session early.  The next
//! scheduled iteration retries by construction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Ticker;
use crate::domain::node::{Address, Port};
use crate::domain::packet::{Delivery, Priority};
use crate::transport::Transport;

/// First tag byte stamped into a session payload.
pub const TAG_FIRST: u8 = b'A';

/// Last tag byte before the counter wraps back to [`TAG_FIRST`].
pub const TAG_LAST: u8 = b'Z';

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address of the server node.
    pub target: Address,
    /// Destination port the server's application handler listens on.
    pub port: Port,
    /// Liveness probe timeout.
    pub ping_timeout: Duration,
    /// Liveness probe payload size in bytes.
    pub ping_payload: usize,
    /// Connection setup timeout.
    pub connect_timeout: Duration,
    /// Greeting prefix sent in every data packet.
    pub greeting: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: 7,
            port: 10,
            ping_timeout: Duration::from_millis(1000),
            ping_payload: 100,
            connect_timeout: Duration::from_millis(1000),
            greeting: "Hello world ".to_string(),
        }
    }
}

/// How a single session ended.  None of these are errors; the enclosing
/// loop's next iteration is the retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The greeting packet was handed to the transport.
    Completed,
    /// Connection setup failed or timed out; nothing was sent.
    ConnectFailed,
    /// The packet pool was exhausted; the connection was closed unused.
    NoBuffer,
}

/// The client session loop.  Owns the tag byte and the session tally, so a
/// test can construct one with any starting state and drive iterations
/// directly.
pub struct SessionLoop {
    transport: Arc<dyn Transport>,
    config: SessionConfig,
    tag: u8,
    sessions: u64,
}

impl SessionLoop {
    pub fn new(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self::with_starting_tag(transport, config, TAG_FIRST)
    }

    /// Starts the tag counter at `tag` instead of `'A'`.
    pub fn with_starting_tag(
        transport: Arc<dyn Transport>,
        config: SessionConfig,
        tag: u8,
    ) -> Self {
        Self {
            transport,
            config,
            tag,
            sessions: 0,
        }
    }

    /// The tag byte the next session will send.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Sessions run so far, whatever their outcome.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Runs one session: ping, reboot notification, then the greeting
    /// exchange.  The connection is closed on every exit path.
    pub async fn run_session(&mut self) -> SessionOutcome {
        self.sessions += 1;
        let target = self.config.target;

        // Liveness probe: the result is reported but never aborts the
        // session.
        match self
            .transport
            .probe(
                target,
                self.config.ping_timeout,
                self.config.ping_payload,
                Delivery::Checked,
            )
            .await
        {
            Some(rtt) => info!(address = target, ?rtt, "ping answered"),
            None => info!(address = target, "ping timed out"),
        }

        // Best-effort reboot notification; no acknowledgement expected.
        self.transport.reboot(target).await;
        debug!(address = target, "reboot request sent");

        let Some(conn) = self
            .transport
            .connect(
                Priority::Norm,
                target,
                self.config.port,
                self.config.connect_timeout,
                Delivery::BestEffort,
            )
            .await
        else {
            warn!(address = target, "connection failed");
            return SessionOutcome::ConnectFailed;
        };

        // Greeting + tag byte + NUL terminator.
        let capacity = self.config.greeting.len() + 2;
        let Some(mut packet) = self.transport.acquire_packet(capacity) else {
            warn!("failed to get packet buffer");
            self.transport.close(conn).await;
            return SessionOutcome::NoBuffer;
        };

        let mut payload = Vec::with_capacity(capacity);
        payload.extend_from_slice(self.config.greeting.as_bytes());
        payload.push(self.tag);
        payload.push(0);
        packet.set_payload(&payload);

        // Ownership of the buffer transfers on send; the connection is
        // closed unconditionally once the send call returns.
        self.transport.send(&conn, packet).await;
        self.transport.close(conn).await;

        self.advance_tag();
        SessionOutcome::Completed
    }

    /// Runs sessions until `running` is cleared, separated by the injected
    /// ticker.
    pub async fn run(&mut self, running: &AtomicBool, ticker: &dyn Ticker) {
        info!("client session loop started");
        while running.load(Ordering::Relaxed) {
            ticker.wait().await;
            if !running.load(Ordering::Relaxed) {
                break;
            }
            self.run_session().await;
        }
        info!("client session loop stopped");
    }

    // The tag cycles through a fixed alphabet rather than overflowing: after
    // 'Z' the next session sends 'A' again.
    fn advance_tag(&mut self) {
        self.tag = if self.tag >= TAG_LAST {
            TAG_FIRST
        } else {
            self.tag + 1
        };
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::LoopbackTransport;
    use crate::transport::{Connection, PortSelector};

    fn served_transport() -> (Arc<LoopbackTransport>, crate::transport::Socket) {
        let transport = Arc::new(LoopbackTransport::new());
        transport.register_node(7, None);
        let socket = transport.bind(PortSelector::Any);
        transport.listen(&socket, 10);
        (transport, socket)
    }

    #[tokio::test]
    async fn test_session_sends_greeting_with_tag_and_terminator() {
        // Arrange
        let (transport, socket) = served_transport();
        let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());

        // Act
        let outcome = session.run_session().await;

        // Assert: the exact 14-byte payload reached the server side.
        assert_eq!(outcome, SessionOutcome::Completed);
        let conn = transport
            .accept(&socket, Duration::from_millis(100))
            .await
            .expect("pending connection");
        let packet = transport
            .read(&conn, Duration::from_millis(50))
            .await
            .expect("greeting packet");
        assert_eq!(packet.payload(), b"Hello world A\0");
        assert_eq!(packet.len(), 14);
        transport.release_packet(packet);
        transport.close(conn).await;
    }

    #[tokio::test]
    async fn test_tag_advances_once_per_completed_session() {
        let (transport, _socket) = served_transport();
        let mut session = SessionLoop::new(transport, SessionConfig::default());

        assert_eq!(session.tag(), b'A');
        session.run_session().await;
        assert_eq!(session.tag(), b'B');
        session.run_session().await;
        assert_eq!(session.tag(), b'C');
    }

    #[tokio::test]
    async fn test_tag_wraps_from_z_back_to_a() {
        let (transport, _socket) = served_transport();
        let mut session =
            SessionLoop::with_starting_tag(transport, SessionConfig::default(), b'Z');

        session.run_session().await;

        assert_eq!(session.tag(), b'A');
    }

    #[tokio::test]
    async fn test_connect_failure_sends_nothing() {
        // Arrange: node exists but nothing is listening.
        let transport = Arc::new(LoopbackTransport::new());
        transport.register_node(7, None);
        let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());

        // Act
        let outcome = session.run_session().await;

        // Assert: zero sends, zero leaked endpoints, tag unchanged.
        assert_eq!(outcome, SessionOutcome::ConnectFailed);
        let stats = transport.stats();
        assert_eq!(stats.sends, 0);
        assert_eq!(stats.open_endpoints, 0);
        assert_eq!(session.tag(), b'A');
    }

    #[tokio::test]
    async fn test_buffer_exhaustion_closes_connection_without_sending() {
        // Arrange: listener present, but the packet pool is empty.
        let transport = Arc::new(LoopbackTransport::with_packet_pool(0));
        transport.register_node(7, None);
        let socket = transport.bind(PortSelector::Any);
        transport.listen(&socket, 10);
        let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());

        // Act
        let outcome = session.run_session().await;

        // Assert: no send, and the half-open connection was closed.
        assert_eq!(outcome, SessionOutcome::NoBuffer);
        let stats = transport.stats();
        assert_eq!(stats.sends, 0);
        assert_eq!(stats.closes, 1);
    }

    #[tokio::test]
    async fn test_ping_timeout_does_not_abort_the_session() {
        // Arrange: probe times out, everything after it succeeds.
        let mut mock = crate::transport::MockTransport::new();
        mock.expect_probe().times(1).returning(|_, _, _, _| None);
        mock.expect_reboot().times(1).returning(|_| ());
        mock.expect_connect()
            .times(1)
            .returning(|_, address, port, _, _| Some(Connection::new(1, address, port)));
        mock.expect_acquire_packet()
            .times(1)
            .returning(|capacity| Some(crate::domain::packet::Packet::new(capacity)));
        mock.expect_send().times(1).returning(|_, _| ());
        mock.expect_close().times(1).returning(|_| ());

        let mut session = SessionLoop::new(Arc::new(mock), SessionConfig::default());

        // Act / Assert: the session proceeds to completion regardless.
        assert_eq!(session.run_session().await, SessionOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_running_flag_clears() {
        // Arrange
        let (transport, _socket) = served_transport();
        let mut session = SessionLoop::new(transport, SessionConfig::default());
        let running = Arc::new(AtomicBool::new(true));
        let ticker = crate::clock::IntervalTicker::new(Duration::from_millis(200));

        // Flip the flag while the first wait is in progress.
        let flag = Arc::clone(&running);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(false, Ordering::Relaxed);
        });

        // Act
        session.run(&running, &ticker).await;

        // Assert: the flag was re-checked after the wait, so no session ran.
        assert_eq!(session.sessions(), 0);
    }
}
