//! BDD step definitions for the connection lifecycle feature

use std::sync::atomic::Ordering;

use cucumber::{given, then, when};
use serde_json::Value;

use station_alerts::channel::ConnectionStatus;
use station_alerts::config::Config;
use station_alerts::transport::ChannelEvent;

use crate::world::{AlertsWorld, Mount};

async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

#[given("the channel is connected")]
async fn channel_is_connected(world: &mut AlertsWorld) {
    world.mount().deliver(ChannelEvent::Connected).await;
}

#[when("the channel connects")]
async fn channel_connects(world: &mut AlertsWorld) {
    world.mount().deliver(ChannelEvent::Connected).await;
}

#[when(expr = "the channel disconnects with reason {string}")]
async fn channel_disconnects(world: &mut AlertsWorld, reason: String) {
    world
        .mount()
        .deliver(ChannelEvent::Disconnected { reason })
        .await;
}

#[when("the dashboard is unmounted")]
async fn dashboard_unmounted(world: &mut AlertsWorld) {
    let closed = world.mount().session.unmount().await;
    assert!(closed, "first unmount should close the channel");
}

#[when("the dashboard is unmounted again")]
async fn dashboard_unmounted_again(world: &mut AlertsWorld) {
    let closed = world.mount().session.unmount().await;
    assert!(!closed, "second unmount should be a no-op");
}

#[when(expr = "the dashboard is mounted and unmounted {int} times")]
async fn mount_cycles(world: &mut AlertsWorld, cycles: usize) {
    let config = world.config.clone().unwrap_or_else(Config::default);
    for _ in 0..cycles {
        let mut mount = Mount::new(&config);
        mount.deliver(ChannelEvent::Connected).await;
        mount.session.unmount().await;
        settle().await;
        world.closes_per_cycle.push(mount.closes.load(Ordering::SeqCst));
    }
}

#[then(expr = "the connection status should be {string}")]
fn connection_status(world: &mut AlertsWorld, expected: String) {
    let status = world.mount().session.status();
    let expected = match expected.as_str() {
        "Connected" => ConnectionStatus::Connected,
        "Disconnected" => ConnectionStatus::Disconnected,
        other => panic!("unknown status {}", other),
    };
    assert_eq!(status, expected);
    assert_eq!(status.to_string(), expected.to_string());
}

#[then(expr = "the backend should have received join_station for {string} {int} time(s)")]
fn join_station_received(world: &mut AlertsWorld, station_id: String, times: usize) {
    let emitted = world.mount().emitted.lock().unwrap().clone();
    let joins: Vec<_> = emitted
        .iter()
        .filter(|(event, _)| event == "join_station")
        .collect();
    assert_eq!(joins.len(), times);
    for (_, args) in joins {
        assert_eq!(args, &vec![Value::String(station_id.clone())]);
    }
}

#[then(expr = "the transport should have been closed {int} time(s)")]
fn transport_closed(world: &mut AlertsWorld, times: usize) {
    assert_eq!(world.mount().closes.load(Ordering::SeqCst), times);
}

#[then("every cycle should have closed its transport exactly once")]
fn every_cycle_closed_once(world: &mut AlertsWorld) {
    assert!(!world.closes_per_cycle.is_empty());
    assert!(world.closes_per_cycle.iter().all(|closes| *closes == 1));
}

#[then("no alert observers should remain")]
fn no_observers_remain(world: &mut AlertsWorld) {
    assert_eq!(world.mount().session.store().observer_count(), 0);
}
