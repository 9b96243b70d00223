//! Web dashboard with JSON API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::channel::ConnectionStatus;
use crate::session::DashboardSession;
use crate::store::AlertStore;
use crate::views::list::{ListRender, ListView};
use crate::views::map::MapView;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub station_id: String,
    pub store: AlertStore,
    pub list: Arc<ListView>,
    pub map: Arc<MapView>,
    pub status: watch::Receiver<ConnectionStatus>,
}

impl DashboardState {
    pub fn from_session(session: &DashboardSession) -> Self {
        Self {
            station_id: session.station_id().to_string(),
            store: session.store().clone(),
            list: Arc::clone(session.list()),
            map: Arc::clone(session.map()),
            status: session.subscribe_status(),
        }
    }
}

/// Build the dashboard axum router
pub fn build_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/status", get(status_handler))
        .route("/api/map", get(map_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn status_badge(status: ConnectionStatus) -> String {
    let (color, bg) = match status {
        ConnectionStatus::Connected => ("#155724", "#d4edda"),
        ConnectionStatus::Disconnected => ("#721c24", "#f8d7da"),
    };
    format!(
        r#"<span id="status-badge" style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>"#,
        color, bg, status
    )
}

fn list_html(render: &ListRender) -> String {
    match render {
        ListRender::Empty { placeholder } => {
            format!(r#"<p style="color: #6c757d;">{}</p>"#, escape_html(placeholder))
        }
        ListRender::Items { items } => items
            .iter()
            .map(|item| {
                let badge = if item.is_new {
                    r#" <span style="background: #dc2626; color: #fff; border-radius: 0.25rem; padding: 0 0.4em; font-size: 0.75em;">NEW</span>"#
                } else {
                    ""
                };
                format!(
                    r#"<div style="margin-bottom: 0.5rem; padding: 0.5rem; border: 1px solid #dee2e6; border-left: 4px solid {color}; border-radius: 0.25rem; background: #fef2f2;">
                    <p style="margin: 0;"><b>Type:</b> <span style="color: {color}; font-weight: 600;">{label}</span>{badge}</p>
                    <p style="margin: 0;"><b>Time:</b> {time}</p>
                    <p style="margin: 0;"><b>Location:</b> {coordinates}</p>
                </div>"#,
                    color = escape_html(&item.color),
                    label = escape_html(&item.label),
                    badge = badge,
                    time = escape_html(&item.time),
                    coordinates = escape_html(&item.coordinates),
                )
            })
            .collect(),
    }
}

/// JSON safe to embed inside a `<script>` element
fn script_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let status = *dashboard.status.borrow();
    let list = list_html(&dashboard.list.render());
    let map = script_json(&dashboard.map.render());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Police Dashboard</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.7.1/dist/leaflet.css">
    <script src="https://unpkg.com/leaflet@1.7.1/dist/leaflet.js"></script>
</head>
<body style="font-family: system-ui, sans-serif; margin: 0 auto; padding: 1rem;">
    <h1>Police Dashboard</h1>
    <p>Station <code>{station_id}</code> {badge}</p>
    <div style="display: flex; gap: 1rem;">
        <section style="width: 33%; border: 1px solid #dee2e6; padding: 0.5rem; overflow-y: auto; max-height: 80vh;">
            <h2>Incoming Alerts</h2>
            <div id="alert-list">{list}</div>
        </section>
        <section id="map" style="width: 67%; height: 80vh; border: 1px solid #dee2e6;"></section>
    </div>
    <script>
        const initial = {map};
        const map = L.map('map').setView([initial.center.lat, initial.center.lon], initial.zoom);
        L.tileLayer(initial.tile_url).addTo(map);
        const markerLayer = L.layerGroup().addTo(map);

        function toIcon(icon) {{
            return L.icon({{
                iconUrl: icon.icon_url,
                iconRetinaUrl: icon.icon_retina_url || undefined,
                shadowUrl: icon.shadow_url || undefined,
                iconSize: icon.icon_size,
                iconAnchor: icon.icon_anchor,
                popupAnchor: icon.popup_anchor,
            }});
        }}

        function drawMap(data) {{
            markerLayer.clearLayers();
            L.circle([data.coverage.center.lat, data.coverage.center.lon], {{
                radius: data.coverage.radius_m,
                color: data.coverage.color,
                fillOpacity: 0.1,
            }}).addTo(markerLayer);
            for (const m of data.markers) {{
                const popup = document.createElement('div');
                const title = document.createElement('b');
                title.style.color = m.color;
                title.textContent = m.popup.title;
                popup.appendChild(title);
                for (const line of [m.popup.time, m.popup.coordinates]) {{
                    if (!line) continue;
                    popup.appendChild(document.createElement('br'));
                    popup.appendChild(document.createTextNode(line));
                }}
                L.marker([m.position.lat, m.position.lon], {{ icon: toIcon(m.icon) }})
                    .bindPopup(popup)
                    .addTo(markerLayer);
            }}
        }}

        function renderList(data) {{
            const list = document.getElementById('alert-list');
            list.replaceChildren();
            if (data.kind === 'empty') {{
                const p = document.createElement('p');
                p.style.color = '#6c757d';
                p.textContent = data.placeholder;
                list.appendChild(p);
                return;
            }}
            for (const item of data.items) {{
                const card = document.createElement('div');
                card.style.cssText = 'margin-bottom: 0.5rem; padding: 0.5rem; border: 1px solid #dee2e6; border-radius: 0.25rem; background: #fef2f2;';
                card.style.borderLeft = '4px solid ' + item.color;
                const rows = [['Type', item.label + (item.is_new ? ' (NEW)' : '')], ['Time', item.time], ['Location', item.coordinates]];
                for (const [name, value] of rows) {{
                    const p = document.createElement('p');
                    p.style.margin = '0';
                    const b = document.createElement('b');
                    b.textContent = name + ': ';
                    p.appendChild(b);
                    p.appendChild(document.createTextNode(value));
                    card.appendChild(p);
                }}
                list.appendChild(card);
            }}
        }}

        function renderStatus(data) {{
            const badge = document.getElementById('status-badge');
            const [color, bg] = data.connected ? ['#155724', '#d4edda'] : ['#721c24', '#f8d7da'];
            badge.style.color = color;
            badge.style.backgroundColor = bg;
            badge.textContent = data.connected ? 'Connected' : 'Disconnected';
        }}

        function refreshData() {{
            fetch('/api/alerts').then(r => r.json()).then(renderList);
            fetch('/api/map').then(r => r.json()).then(drawMap);
            fetch('/api/status').then(r => r.json()).then(renderStatus);
        }}

        drawMap(initial);
        setInterval(refreshData, 5000);
    </script>
</body>
</html>"#,
        station_id = escape_html(&dashboard.station_id),
        badge = status_badge(status),
        list = list,
        map = map,
    );

    Html(html)
}

async fn alerts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    axum::Json(dashboard.list.render())
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let status = *dashboard.status.borrow();
    axum::Json(serde_json::json!({
        "station_id": dashboard.station_id,
        "status": status,
        "connected": status.is_connected(),
        "alert_count": dashboard.store.len(),
    }))
}

async fn map_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    axum::Json(dashboard.map.render())
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{FixedOffset, TimeZone, Utc};
    use tower::ServiceExt;

    use crate::alert::{Alert, Location};
    use crate::config::{MapConfig, StationConfig};
    use crate::store::AlertStore;
    use crate::views::icons::IconRegistry;
    use crate::views::{Mounted, TimeFormatter};

    struct Fixture {
        state: DashboardState,
        status: watch::Sender<ConnectionStatus>,
        _list: Mounted<ListView>,
        _map: Mounted<MapView>,
    }

    fn setup() -> Fixture {
        let store = AlertStore::default();
        let formatter = TimeFormatter::fixed(FixedOffset::east_opt(0).unwrap());
        let list = Mounted::mount(&store, ListView::new(formatter));
        let map = Mounted::mount(
            &store,
            MapView::new(
                &StationConfig::default(),
                &MapConfig::default(),
                IconRegistry::default(),
                formatter,
            ),
        );
        let (status, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        Fixture {
            state: DashboardState {
                station_id: "station-1".to_string(),
                store,
                list: Arc::clone(list.view()),
                map: Arc::clone(map.view()),
                status: status_rx,
            },
            status,
            _list: list,
            _map: map,
        }
    }

    fn violence() -> Alert {
        Alert {
            event_type: "violence".to_string(),
            timestamp_utc: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            location: Location { lat: 19.0, lon: 72.8 },
        }
    }

    async fn get(state: DashboardState, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let fixture = setup();
        let (status, body) = get(fixture.state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn alerts_empty_state() {
        let fixture = setup();
        let (status, body) = get(fixture.state, "/api/alerts").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "empty");
    }

    #[tokio::test]
    async fn alerts_returns_rendered_items() {
        let fixture = setup();
        fixture.state.store.append(violence());

        let (_, body) = get(fixture.state, "/api/alerts").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "items");
        assert_eq!(json["items"][0]["label"], "violence");
        assert_eq!(json["items"][0]["coordinates"], "19.0000, 72.8000");
        assert_eq!(json["items"][0]["is_new"], true);
    }

    #[tokio::test]
    async fn status_reflects_connection() {
        let fixture = setup();
        fixture.status.send_replace(ConnectionStatus::Connected);
        fixture.state.store.append(violence());

        let (_, body) = get(fixture.state.clone(), "/api/status").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["station_id"], "station-1");
        assert_eq!(json["status"], "connected");
        assert_eq!(json["connected"], true);
        assert_eq!(json["alert_count"], 1);
    }

    #[tokio::test]
    async fn map_includes_station_and_alerts() {
        let fixture = setup();
        fixture.state.store.append(violence());

        let (_, body) = get(fixture.state, "/api/map").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let markers = json["markers"].as_array().unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0]["role"], "station");
        assert_eq!(markers[1]["popup"]["coordinates"], "19.000000, 72.800000");
        assert_eq!(json["zoom"], 14);
    }

    #[tokio::test]
    async fn index_returns_html() {
        let fixture = setup();
        let (status, body) = get(fixture.state, "/").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Police Dashboard"));
        assert!(html.contains("Disconnected"));
        assert!(html.contains("No alerts yet"));
    }

    #[tokio::test]
    async fn index_escapes_alert_text() {
        let fixture = setup();
        fixture.state.store.append(Alert {
            event_type: "<script>alert(1)</script>".to_string(),
            ..violence()
        });

        let (_, body) = get(fixture.state, "/").await;
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("\"<script>alert(1)"));
        assert!(html.contains("NEW"));
    }

    #[test]
    fn escape_html_handles_specials() {
        assert_eq!(escape_html(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
