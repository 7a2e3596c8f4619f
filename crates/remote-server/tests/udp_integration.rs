//! End-to-end tests over a real UDP socket on the loopback interface.
//!
//! The server runs with the headless input backend and a mock screen, so the
//! tests never touch the desktop.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use remote_core::protocol::messages::error_text;
use remote_core::PairingSecret;
use remote_server::application::{Dispatcher, FrameProducer, InjectInputUseCase};
use remote_server::domain::{CaptureSettings, ServerConfig};
use remote_server::infrastructure::input_injection::HeadlessInputInjector;
use remote_server::infrastructure::network::UdpServer;
use remote_server::infrastructure::screen_capture::mock::MockScreenCapturer;
use serde_json::Value;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const CODE: &str = "T3ST42";
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
    capturer: Arc<MockScreenCapturer>,
}

fn loopback_config(max_datagram_bytes: usize) -> ServerConfig {
    ServerConfig {
        udp_bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        http_bind_addr: None,
        capture: CaptureSettings {
            scale_factor: 1.0,
            jpeg_quality: 80,
        },
        max_datagram_bytes,
        ..ServerConfig::default()
    }
}

async fn start_server(capturer: MockScreenCapturer, max_datagram_bytes: usize) -> Harness {
    start_server_with(capturer, loopback_config(max_datagram_bytes)).await
}

async fn start_server_with(capturer: MockScreenCapturer, config: ServerConfig) -> Harness {
    let capturer = Arc::new(capturer);
    let input = InjectInputUseCase::new(Arc::new(HeadlessInputInjector::default()), config.motion);
    let dispatcher = Dispatcher::new(
        PairingSecret::new(CODE).unwrap(),
        config.session_policy,
        input,
    );
    let frames = FrameProducer::new(capturer.clone(), config.capture);

    let server = UdpServer::bind(&config, dispatcher, frames).await.unwrap();
    let addr = server.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let task = tokio::spawn(async move {
        server.run(flag).await.unwrap();
    });

    Harness {
        addr,
        running,
        task,
        capturer,
    }
}

async fn client_for(server: SocketAddr) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(server).await.unwrap();
    socket
}

async fn recv_json(socket: &UdpSocket) -> Value {
    let mut buf = vec![0u8; 65_535];
    let len = timeout(REPLY_TIMEOUT, socket.recv(&mut buf))
        .await
        .expect("no reply within timeout")
        .unwrap();
    serde_json::from_slice(&buf[..len]).unwrap()
}

async fn send_and_recv(socket: &UdpSocket, datagram: &str) -> Value {
    socket.send(datagram.as_bytes()).await.unwrap();
    recv_json(socket).await
}

/// A screen whose pixels vary byte to byte, so its JPEG compresses badly.
fn noisy_capturer(width: u32, height: u32) -> MockScreenCapturer {
    let mut capturer = MockScreenCapturer::solid(width, height);
    for (i, px) in capturer.bitmap.pixels.iter_mut().enumerate() {
        *px = (i * 7919 % 251) as u8;
    }
    capturer
}

async fn authenticate(socket: &UdpSocket) {
    let reply = send_and_recv(socket, &format!(r#"{{"type":"auth","code":"{CODE}"}}"#)).await;
    assert_eq!(reply["type"], "auth_response");
    assert_eq!(reply["status"], "success");
}

#[tokio::test]
async fn test_auth_keepalive_and_unauthorized_over_udp() {
    // Arrange
    let harness = start_server(MockScreenCapturer::solid(64, 48), 60_000).await;
    let client = client_for(harness.addr).await;

    // Act / Assert: unauthenticated command is refused
    let refused = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;
    assert_eq!(refused["type"], "error");
    assert_eq!(refused["message"], error_text::UNAUTHORIZED);

    // wrong code
    let wrong = send_and_recv(&client, r#"{"type":"auth","code":"NOPE00"}"#).await;
    assert_eq!(wrong["message"], error_text::INVALID_CODE);

    // right code, then keepalive is answered with a timestamp
    authenticate(&client).await;
    let pong = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;
    assert_eq!(pong["type"], "keepalive_response");
    assert!(pong["timestamp"].as_u64().unwrap() > 0);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_malformed_datagram_gets_format_error() {
    let harness = start_server(MockScreenCapturer::solid(8, 8), 60_000).await;
    let client = client_for(harness.addr).await;

    let reply = send_and_recv(&client, "definitely not json").await;

    assert_eq!(reply["message"], error_text::INVALID_FORMAT);
    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_request_frame_returns_base64_jpeg() {
    // Arrange
    let harness = start_server(MockScreenCapturer::solid(64, 48), 60_000).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act
    let frame = send_and_recv(&client, r#"{"type":"request_frame"}"#).await;

    // Assert
    assert_eq!(frame["type"], "frame");
    assert!(frame["data"].as_str().unwrap().starts_with("/9j/"));
    assert!(frame.get("chunk_count").is_none());
    assert_eq!(harness.capturer.capture_count(), 1);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_large_frame_arrives_in_ordered_chunks() {
    // Arrange: a small noisy screen and a datagram limit it cannot fit in
    let config = loopback_config(2048);
    let expected = FrameProducer::new(Arc::new(noisy_capturer(96, 72)), config.capture)
        .produce()
        .unwrap();
    let harness = start_server_with(noisy_capturer(96, 72), config).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act
    client
        .send(br#"{"type":"request_frame"}"#)
        .await
        .unwrap();
    let first = recv_json(&client).await;
    let count = first["chunk_count"].as_u64().unwrap();
    let mut data = first["data"].as_str().unwrap().to_string();
    for expected_index in 1..count {
        let chunk = recv_json(&client).await;
        assert_eq!(chunk["chunk_index"].as_u64().unwrap(), expected_index);
        assert_eq!(chunk["chunk_count"].as_u64().unwrap(), count);
        assert_eq!(chunk["frame_id"], first["frame_id"]);
        data.push_str(chunk["data"].as_str().unwrap());
    }

    // Assert
    assert!(count > 1);
    assert!(count <= 32, "{count} chunks is more than the test expects");
    assert_eq!(first["chunk_index"], 0);
    assert_eq!(data, expected);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_capture_failure_sends_nothing_and_session_survives() {
    let harness = start_server(MockScreenCapturer::failing(), 60_000).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    client.send(br#"{"type":"request_frame"}"#).await.unwrap();
    // The next reply must be the keepalive answer, not a frame or an error.
    let reply = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;

    assert_eq!(reply["type"], "keepalive_response");
    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_notifies_authenticated_client() {
    // Arrange
    let harness = start_server(MockScreenCapturer::solid(8, 8), 60_000).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act
    harness.running.store(false, Ordering::Relaxed);
    let notice = recv_json(&client).await;
    harness.task.await.unwrap();

    // Assert
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["message"], error_text::SHUTTING_DOWN);
}

#[tokio::test]
async fn test_frame_is_not_sent_to_unauthenticated_client() {
    let harness = start_server(MockScreenCapturer::solid(8, 8), 60_000).await;
    let client = client_for(harness.addr).await;

    let reply = send_and_recv(&client, r#"{"type":"request_frame"}"#).await;

    assert_eq!(reply["message"], error_text::UNAUTHORIZED);
    assert_eq!(harness.capturer.capture_count(), 0);
    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_sweeper_evicts_idle_session_inside_server_loop() {
    // Arrange
    let config = ServerConfig {
        inactivity_timeout: Duration::from_millis(300),
        sweep_interval: Duration::from_millis(200),
        ..loopback_config(60_000)
    };
    let harness = start_server_with(MockScreenCapturer::solid(8, 8), config).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act: stay silent until a sweep notices
    let notice = recv_json(&client).await;

    // Assert
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["message"], error_text::SESSION_EXPIRED);
    let refused = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;
    assert_eq!(refused["message"], error_text::UNAUTHORIZED);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_frame_requests_while_capture_pending_are_coalesced() {
    // Arrange
    let mut capturer = MockScreenCapturer::solid(64, 48);
    capturer.capture_delay = Duration::from_millis(300);
    let harness = start_server(capturer, 60_000).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act
    for _ in 0..5 {
        client.send(br#"{"type":"request_frame"}"#).await.unwrap();
    }
    let frame = recv_json(&client).await;

    // Assert: exactly one capture, and the next reply is not a second frame
    assert_eq!(frame["type"], "frame");
    let pong = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;
    assert_eq!(pong["type"], "keepalive_response");
    assert_eq!(harness.capturer.capture_count(), 1);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_finished_frame_is_dropped_after_disconnect() {
    // Arrange
    let mut capturer = MockScreenCapturer::solid(64, 48);
    capturer.capture_delay = Duration::from_millis(300);
    let harness = start_server(capturer, 60_000).await;
    let client = client_for(harness.addr).await;
    authenticate(&client).await;

    // Act: disconnect while the capture is still running, then let it finish
    client.send(br#"{"type":"request_frame"}"#).await.unwrap();
    client.send(br#"{"type":"disconnect"}"#).await.unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    // Assert: the first datagram waiting is the reply to this keepalive
    let reply = send_and_recv(&client, r#"{"type":"keepalive"}"#).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], error_text::UNAUTHORIZED);
    assert_eq!(harness.capturer.capture_count(), 1);

    harness.running.store(false, Ordering::Relaxed);
    harness.task.await.unwrap();
}
