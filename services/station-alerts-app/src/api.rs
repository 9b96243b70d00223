//! Client-side API fetch helpers
//!
//! These types mirror the server-side JSON response structures
//! and are shared between SSR and client-side hydration.

use serde::{Deserialize, Serialize};

/// Connection state as returned by /api/status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    pub station_id: String,
    pub status: String,
    pub connected: bool,
    pub alert_count: usize,
}

/// One list entry as returned by /api/alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertItemResponse {
    pub label: String,
    pub color: String,
    pub time: String,
    pub coordinates: String,
    pub is_new: bool,
}

/// Alert list as returned by /api/alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertListResponse {
    Empty { placeholder: String },
    Items { items: Vec<AlertItemResponse> },
}

impl Default for AlertListResponse {
    fn default() -> Self {
        AlertListResponse::Items { items: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupResponse {
    pub title: String,
    pub time: Option<String>,
    pub coordinates: String,
}

/// One marker as returned by /api/map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerResponse {
    pub role: String,
    pub position: PositionResponse,
    pub color: String,
    pub popup: PopupResponse,
}

/// Map contents as returned by /api/map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapResponse {
    pub zoom: u8,
    pub markers: Vec<MarkerResponse>,
}

/// GET a JSON document from the dashboard server
#[allow(unused_variables)]
pub async fn fetch_json<T>(path: &str) -> Result<T, String>
where
    T: for<'de> Deserialize<'de> + Default,
{
    // In SSR mode, this returns the default (the server renders the initial page)
    #[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
    {
        let window = web_sys::window().ok_or("no window")?;
        let origin = window.location().origin().map_err(|e| format!("{:?}", e))?;
        let url = format!("{}{}", origin, path);

        let resp = gloo_net::http::Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("{}", e))?;

        resp.json().await.map_err(|e| format!("{}", e))
    }

    #[cfg(not(all(feature = "hydrate", target_arch = "wasm32")))]
    {
        Ok(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_list_parses_empty_kind() {
        let json = r#"{"kind":"empty","placeholder":"No alerts yet. Waiting for incoming alerts..."}"#;
        let parsed: AlertListResponse = serde_json::from_str(json).unwrap();
        match parsed {
            AlertListResponse::Empty { placeholder } => {
                assert!(placeholder.starts_with("No alerts yet"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn map_ignores_fields_the_ui_does_not_draw() {
        let json = r##"{
            "center": {"lat": 19.2, "lon": 72.8},
            "zoom": 14,
            "tile_url": "https://tile.example/{z}/{x}/{y}.png",
            "coverage": {"center": {"lat": 19.2, "lon": 72.8}, "radius_m": 500.0, "color": "#2563eb"},
            "markers": [{
                "role": "station",
                "position": {"lat": 19.2, "lon": 72.8},
                "icon": {"icon_url": "x.png"},
                "color": "#2563eb",
                "popup": {"title": "Station s1", "time": null, "coordinates": "19.200000, 72.800000"}
            }]
        }"##;
        let parsed: MapResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.zoom, 14);
        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].role, "station");
    }
}
