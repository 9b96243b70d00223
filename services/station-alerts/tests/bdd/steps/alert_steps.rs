//! BDD step definitions for the alert stream feature

use cucumber::{given, then, when};
use serde_json::json;

use station_alerts::config::Config;
use station_alerts::transport::ChannelEvent;
use station_alerts::views::list::{ListRender, EMPTY_PLACEHOLDER};

use crate::world::{AlertsWorld, Mount};

fn incoming_alert(payload: serde_json::Value) -> ChannelEvent {
    ChannelEvent::Event {
        name: "incoming_alert".to_string(),
        args: vec![payload],
    }
}

#[given(expr = "a mounted dashboard for station {string}")]
fn mounted_dashboard(world: &mut AlertsWorld, station_id: String) {
    let mut config = Config::default();
    config.station.id = station_id;
    config.display.utc_offset_minutes = Some(0);
    world.mount = Some(Mount::new(&config));
    world.config = Some(config);
}

#[when(expr = "a {string} alert arrives at {float}, {float}")]
async fn alert_arrives(world: &mut AlertsWorld, event_type: String, lat: f64, lon: f64) {
    let payload = json!({
        "event_type": event_type,
        "timestamp_utc": "2024-01-01T10:00:00Z",
        "location": {"lat": lat, "lon": lon}
    });
    world.mount().deliver(incoming_alert(payload)).await;
}

#[when(expr = "a {string} alert arrives with timestamp {string} at {float}, {float}")]
async fn alert_arrives_at_time(
    world: &mut AlertsWorld,
    event_type: String,
    timestamp: String,
    lat: f64,
    lon: f64,
) {
    let payload = json!({
        "event_type": event_type,
        "timestamp_utc": timestamp,
        "location": {"lat": lat, "lon": lon}
    });
    world.mount().deliver(incoming_alert(payload)).await;
}

#[when("an alert without a location arrives")]
async fn alert_without_location(world: &mut AlertsWorld) {
    let payload = json!({
        "event_type": "violence",
        "timestamp_utc": "2024-01-01T10:00:00Z"
    });
    world.mount().deliver(incoming_alert(payload)).await;
}

#[then(expr = "the alert list should read {string}")]
fn list_reads(world: &mut AlertsWorld, expected: String) {
    let render = world.mount().session.list().render();
    let labels: Vec<&str> = render.items().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels.join(", "), expected);
}

#[then("only the first list entry should be marked new")]
fn only_first_new(world: &mut AlertsWorld) {
    let render = world.mount().session.list().render();
    let flags: Vec<bool> = render.items().iter().map(|i| i.is_new).collect();
    assert!(!flags.is_empty(), "list is empty");
    assert!(flags[0]);
    assert!(flags[1..].iter().all(|new| !new));
}

#[then("the alert list should show the empty placeholder")]
fn list_shows_placeholder(world: &mut AlertsWorld) {
    assert_eq!(
        world.mount().session.list().render(),
        ListRender::Empty {
            placeholder: EMPTY_PLACEHOLDER.to_string()
        }
    );
}

#[then(expr = "the map should show {int} marker(s)")]
fn map_marker_count(world: &mut AlertsWorld, expected: usize) {
    let render = world.mount().session.map().render();
    assert_eq!(render.markers.len(), expected);
    assert_eq!(render.markers[0].role, "station");
}

#[then(expr = "the first list entry should have label {string} and coordinates {string}")]
fn first_entry(world: &mut AlertsWorld, label: String, coordinates: String) {
    let render = world.mount().session.list().render();
    let item = render.items().first().expect("list is empty");
    assert_eq!(item.label, label);
    assert_eq!(item.coordinates, coordinates);
}

#[then(expr = "the first list entry should show time {string}")]
fn first_entry_time(world: &mut AlertsWorld, time: String) {
    let render = world.mount().session.list().render();
    assert_eq!(render.items()[0].time, time);
}

#[then(expr = "the newest map popup should show coordinates {string}")]
fn newest_popup(world: &mut AlertsWorld, coordinates: String) {
    let render = world.mount().session.map().render();
    let marker = render.markers.get(1).expect("no alert markers");
    assert_eq!(marker.popup.coordinates, coordinates);
}
