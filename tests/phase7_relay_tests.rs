mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::packet_json;
use locus::config::LocusConfig;
use locus::relay::{Relay, RelayConfig};
use locus::session::{LocusSession, SessionStatus};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

async fn start_relay() -> (SocketAddr, SocketAddr, CancellationToken, JoinHandle<()>) {
    start_relay_with(RelayConfig::default().buffer).await
}

async fn start_relay_with(buffer: usize) -> (SocketAddr, SocketAddr, CancellationToken, JoinHandle<()>) {
    let relay = Relay::bind(&RelayConfig {
        publish_addr: "127.0.0.1:0".to_string(),
        subscribe_addr: "127.0.0.1:0".to_string(),
        buffer,
        ..RelayConfig::default()
    })
    .await
    .unwrap();
    let publish = relay.publish_addr().unwrap();
    let subscribe = relay.subscribe_addr().unwrap();

    let token = CancellationToken::new();
    let task = tokio::spawn(relay.run(token.clone()));
    (publish, subscribe, token, task)
}

async fn first_line(addr: SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"{\"subscribe\":\"locus_data\"}\n").await.unwrap();
    let mut lines = BufReader::new(stream).lines();
    lines.next_line().await.unwrap().expect("relay closed before first message")
}

#[tokio::test]
async fn test_relay_fans_out_wrapped_packets() {
    let (publish, subscribe, token, task) = start_relay().await;

    let reader_a = tokio::spawn(first_line(subscribe));
    let reader_b = tokio::spawn(first_line(subscribe));

    let body = packet_json(&[("Walking", 0.8), ("Idle", 0.2)]);
    let mut publisher = TcpStream::connect(publish).await.unwrap();
    let line = format!("{}\n", body);

    // Subscribers register asynchronously; keep publishing until both hear it.
    let publishing = async {
        loop {
            publisher.write_all(line.as_bytes()).await.unwrap();
            sleep(Duration::from_millis(20)).await;
        }
    };
    let received = async { (reader_a.await.unwrap(), reader_b.await.unwrap()) };

    let (a, b) = timeout(WAIT, async {
        tokio::select! {
            lines = received => lines,
            _ = publishing => unreachable!(),
        }
    })
    .await
    .expect("subscribers never received a message");

    for raw in [a, b] {
        let envelope: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["event"], "locus_data");
        assert_eq!(envelope["data"], body);
    }

    token.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_session_through_relay() {
    let (publish, subscribe, token, task) = start_relay().await;

    let mut config = LocusConfig::default();
    config.endpoint.port = subscribe.port();
    let session = LocusSession::new(config).unwrap().start();

    let mut status = session.subscribe_status();
    timeout(WAIT, async {
        while !status.borrow_and_update().is_connected() {
            status.changed().await.unwrap();
        }
    })
    .await
    .expect("session never connected to relay");

    let mut publisher = TcpStream::connect(publish).await.unwrap();
    let mut snapshots = session.subscribe_snapshots();

    let snapshot = timeout(WAIT, async {
        loop {
            // Non-JSON lines are skipped by the relay, not forwarded
            publisher.write_all(b"not json at all\n").await.unwrap();
            let body = packet_json(&[("Cleaning", 0.85), ("Idle", 0.15)]);
            publisher.write_all(format!("{}\n", body).as_bytes()).await.unwrap();

            let _ = timeout(Duration::from_millis(50), snapshots.changed()).await;
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.version > 0 {
                return snapshot;
            }
        }
    })
    .await
    .expect("packet never reached the session");

    let decision = snapshot.decision.as_ref().unwrap();
    assert_eq!(decision.top_action, "Cleaning");
    assert!(decision.locked);
    assert_eq!(snapshot.telemetry.packet_stats.dropped(), 0);

    session.stop().await;
    token.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_relay_shutdown_closes_subscribers() {
    let (_publish, subscribe, token, task) = start_relay().await;

    let stream = TcpStream::connect(subscribe).await.unwrap();
    let mut lines = BufReader::new(stream).lines();
    // Give the accept loop a moment to register the subscriber
    sleep(Duration::from_millis(50)).await;

    token.cancel();
    task.await.unwrap();

    let eof = timeout(WAIT, lines.next_line()).await.unwrap();
    assert!(matches!(eof, Ok(None) | Err(_)));
}

#[tokio::test]
async fn test_session_reports_relay_outage() {
    let (_publish, subscribe, token, task) = start_relay().await;

    let mut config = LocusConfig::default();
    config.endpoint.port = subscribe.port();
    config.reconnect.enabled = false;
    let session = LocusSession::new(config).unwrap().start();

    let mut status = session.subscribe_status();
    timeout(WAIT, async {
        while !status.borrow_and_update().is_connected() {
            status.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    token.cancel();
    task.await.unwrap();

    timeout(WAIT, async {
        while *status.borrow_and_update() != SessionStatus::Stopped {
            status.changed().await.unwrap();
        }
    })
    .await
    .expect("session should stop once the relay goes away");

    let totals = session.stop().await.unwrap();
    assert_eq!(totals.link_stats.disconnects, 1);
}

fn packet_at(x: f64) -> Value {
    let mut body = packet_json(&[("Walking", 0.8), ("Idle", 0.2)]);
    body["location"]["x"] = serde_json::json!(x);
    body
}

async fn read_until_x(lines: &mut Lines<BufReader<TcpStream>>, x: f64) -> usize {
    let mut seen = 0;
    loop {
        let raw = lines.next_line().await.unwrap().expect("relay closed the subscriber");
        seen += 1;
        let envelope: Value = serde_json::from_str(&raw).unwrap();
        if envelope["data"]["location"]["x"] == x {
            return seen;
        }
    }
}

#[tokio::test]
async fn test_lagging_subscriber_skips_to_newest() {
    let (publish, subscribe, token, task) = start_relay_with(1).await;

    let mut sub = TcpStream::connect(subscribe).await.unwrap();
    sub.write_all(b"{\"subscribe\":\"locus_data\"}\n").await.unwrap();
    let mut lines = BufReader::new(sub).lines();
    let mut publisher = TcpStream::connect(publish).await.unwrap();

    // Wait until the subscriber is registered
    let warmup = format!("{}\n", packet_at(-1.0));
    timeout(WAIT, async {
        loop {
            publisher.write_all(warmup.as_bytes()).await.unwrap();
            if let Ok(line) = timeout(Duration::from_millis(50), lines.next_line()).await {
                line.unwrap().expect("relay closed the subscriber");
                return;
            }
        }
    })
    .await
    .expect("subscriber never registered");

    // A burst far larger than the one-slot buffer
    let burst: String = (0..20).map(|i| format!("{}\n", packet_at(i as f64))).collect();
    publisher.write_all(burst.as_bytes()).await.unwrap();
    timeout(WAIT, read_until_x(&mut lines, 19.0))
        .await
        .expect("newest message never arrived");

    // Still connected after lagging
    let after = format!("{}\n", packet_at(100.0));
    publisher.write_all(after.as_bytes()).await.unwrap();
    timeout(WAIT, read_until_x(&mut lines, 100.0))
        .await
        .expect("subscriber dropped after lagging");

    token.cancel();
    task.await.unwrap();
}
