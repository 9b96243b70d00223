//! BDD step definitions for alert classification colors

use cucumber::{then, when};
use serde_json::json;

use station_alerts::transport::ChannelEvent;

use crate::world::AlertsWorld;

#[when(expr = "an alert classified as {string} arrives")]
async fn classified_alert_arrives(world: &mut AlertsWorld, event_type: String) {
    let payload = json!({
        "event_type": event_type,
        "timestamp_utc": "2024-01-01T10:00:00Z",
        "location": {"lat": 19.2063, "lon": 72.8728}
    });
    world
        .mount()
        .deliver(ChannelEvent::Event {
            name: "incoming_alert".to_string(),
            args: vec![payload],
        })
        .await;
}

#[then(expr = "the list entry should be colored {string}")]
fn list_entry_color(world: &mut AlertsWorld, color: String) {
    let render = world.mount().session.list().render();
    assert_eq!(render.items()[0].color, color);
}

#[then(expr = "the alert marker should be colored {string}")]
fn marker_color(world: &mut AlertsWorld, color: String) {
    let render = world.mount().session.map().render();
    assert_eq!(render.markers[1].color, color);
}
