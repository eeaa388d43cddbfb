//! End-to-end exchange over the loopback transport: a client session loop
//! talking to a server dispatch loop on the same in-process network.

use std::sync::Arc;
use std::time::Duration;

use mesh_core::{
    DispatchConfig, DispatchLoop, InboundHandler, LoopbackTransport, RecordingHandler,
    ScanConfig, Scanner, SessionConfig, SessionLoop, Transport,
};

struct NullProgress;
impl mesh_core::ScanProgress for NullProgress {}

fn wired_network() -> Arc<LoopbackTransport> {
    let transport = Arc::new(LoopbackTransport::new());
    transport.register_node(7, None);
    transport
}

#[tokio::test]
async fn test_greeting_travels_from_session_loop_to_application_handler() {
    // Arrange: server bound and listening on node 7.
    let transport = wired_network();
    let handler = Arc::new(RecordingHandler::new());
    let mut dispatch = DispatchLoop::new(
        transport.clone(),
        DispatchConfig::default(),
        handler.clone() as Arc<dyn InboundHandler>,
    );
    let socket = dispatch.bind();

    let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());

    // Act: one client session, then serve the resulting connection.
    session.run_session().await;
    let conn = transport
        .accept(&socket, Duration::from_millis(100))
        .await
        .expect("pending connection");
    dispatch.serve_connection(conn).await;

    // Assert: the handler saw exactly the greeting text, terminator stripped.
    assert_eq!(handler.messages(), vec!["Hello world A".to_string()]);
    assert_eq!(dispatch.received(), 1);
}

#[tokio::test]
async fn test_consecutive_sessions_deliver_advancing_tags() {
    let transport = wired_network();
    let handler = Arc::new(RecordingHandler::new());
    let mut dispatch = DispatchLoop::new(
        transport.clone(),
        DispatchConfig::default(),
        handler.clone() as Arc<dyn InboundHandler>,
    );
    let socket = dispatch.bind();

    let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());

    for _ in 0..3 {
        session.run_session().await;
        let conn = transport
            .accept(&socket, Duration::from_millis(100))
            .await
            .expect("pending connection");
        dispatch.serve_connection(conn).await;
    }

    assert_eq!(
        handler.messages(),
        vec![
            "Hello world A".to_string(),
            "Hello world B".to_string(),
            "Hello world C".to_string(),
        ]
    );
    assert_eq!(dispatch.received(), 3);
}

#[tokio::test]
async fn test_scan_finds_the_server_node_before_the_exchange() {
    // The operational sequence: discover the network, then start talking.
    let transport = wired_network();
    transport.register_node(3, None);

    let scanner = Scanner::new(transport.clone(), ScanConfig::default());
    let report = scanner.run(&NullProgress).await;

    assert_eq!(report.addresses(), vec![3, 7]);
    assert_eq!(report.probes_issued, 17);
}

#[tokio::test]
async fn test_exchange_leaks_no_endpoints_or_packet_buffers() {
    // After a full round trip everything must be returned: both connection
    // halves closed and the packet buffer credited back to the pool.
    let transport = wired_network();
    let pool_before = transport.pool_free();

    let handler = Arc::new(RecordingHandler::new());
    let mut dispatch = DispatchLoop::new(
        transport.clone(),
        DispatchConfig::default(),
        handler as Arc<dyn InboundHandler>,
    );
    let socket = dispatch.bind();

    let mut session = SessionLoop::new(transport.clone(), SessionConfig::default());
    session.run_session().await;
    let conn = transport
        .accept(&socket, Duration::from_millis(100))
        .await
        .expect("pending connection");
    dispatch.serve_connection(conn).await;

    let stats = transport.stats();
    assert_eq!(stats.open_endpoints, 0);
    assert_eq!(transport.pool_free(), pool_before);
}
