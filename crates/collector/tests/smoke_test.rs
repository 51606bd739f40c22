//! Workspace smoke test: settings file to delivered event
//!
//! Runs the collector in kernel-demultiplexed mode on loopback so no
//! privileges are needed.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use silo_config::Settings;
use silo_pipeline::{Collector, CollectorConfig, SocketMode, State};
use silo_sinks::NullSink;
use tokio::net::UdpSocket;

#[tokio::test]
async fn test_settings_to_delivered_event() {
    // Settings file is created with defaults on first touch
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(settings.udp_port, 514);
    assert_eq!(
        settings.bind_address().unwrap(),
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    );

    // Loopback collector; ephemeral port instead of the privileged 514
    let collector = Collector::new(CollectorConfig {
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        mode: SocketMode::Udp,
        concurrency: 2,
        channel_capacity: 16,
        pool_size: 4,
        buffer_size: 2048,
        ..Default::default()
    });
    let sink = Arc::new(NullSink::new());
    collector.register_sink(sink.clone());

    collector.start().unwrap();
    let addr = collector.local_addr().unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(b"<13>smoke test message", addr)
        .await
        .unwrap();

    for _ in 0..100 {
        if sink.messages_received() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    collector.stop();
    let snapshot = collector.join().await;

    assert_eq!(sink.messages_received(), 1);
    assert_eq!(snapshot.dispatched, 1);
    assert_eq!(collector.state(), State::Stopped);
    assert_eq!(collector.pool().in_flight(), 0);
}
