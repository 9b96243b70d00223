//! Station-centered alert map

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::alert::{Alert, Location};
use crate::config::{MapConfig, StationConfig};
use crate::store::{AlertObserver, StoreChange};
use crate::views::icons::{IconDescriptor, IconRegistry, MarkerRole};
use crate::views::{format_coordinates, TimeFormatter, POPUP_COORDINATE_PRECISION};

/// Popup content attached to a marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub title: String,
    pub time: Option<String>,
    pub coordinates: String,
}

/// One point on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// `station` or `alert-<classification>`
    pub role: String,
    pub position: Location,
    pub icon: IconDescriptor,
    pub color: String,
    pub popup: Popup,
}

/// Constant-radius circle drawn around the station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageCircle {
    pub center: Location,
    pub radius_m: f64,
    pub color: String,
}

/// Everything needed to draw the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRender {
    pub center: Location,
    pub zoom: u8,
    pub tile_url: String,
    pub coverage: CoverageCircle,
    /// Station marker first, then alerts newest first
    pub markers: Vec<Marker>,
}

/// Map view kept in sync with the store
#[derive(Debug)]
pub struct MapView {
    station_marker: Marker,
    coverage: CoverageCircle,
    zoom: u8,
    tile_url: String,
    icons: IconRegistry,
    formatter: TimeFormatter,
    alert_markers: Mutex<VecDeque<Marker>>,
}

impl MapView {
    pub fn new(
        station: &StationConfig,
        map: &MapConfig,
        icons: IconRegistry,
        formatter: TimeFormatter,
    ) -> Self {
        let center = Location {
            lat: station.latitude,
            lon: station.longitude,
        };
        let role = MarkerRole::Station;
        let icon = icons.resolve(&role).clone();
        let color = icon.color.clone().unwrap_or_else(|| "#2563eb".to_string());

        let station_marker = Marker {
            role: role.key(),
            position: center,
            icon,
            color: color.clone(),
            popup: Popup {
                title: format!("Station {}", station.id),
                time: None,
                coordinates: format_coordinates(&center, POPUP_COORDINATE_PRECISION),
            },
        };

        Self {
            station_marker,
            coverage: CoverageCircle {
                center,
                radius_m: map.coverage_radius_m,
                color,
            },
            zoom: map.zoom,
            tile_url: map.tile_url.clone(),
            icons,
            formatter,
            alert_markers: Mutex::new(VecDeque::new()),
        }
    }

    fn alert_marker(&self, alert: &Alert) -> Marker {
        let role = MarkerRole::alert(&alert.event_type);
        Marker {
            role: role.key(),
            position: alert.location,
            icon: self.icons.resolve(&role).clone(),
            color: alert.color().to_string(),
            popup: Popup {
                title: alert.event_type.clone(),
                time: Some(self.formatter.format(&alert.timestamp_utc)),
                coordinates: format_coordinates(&alert.location, POPUP_COORDINATE_PRECISION),
            },
        }
    }

    /// Station marker plus one marker per alert
    pub fn marker_count(&self) -> usize {
        1 + self
            .alert_markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn render(&self) -> MapRender {
        let alert_markers = self
            .alert_markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut markers = Vec::with_capacity(1 + alert_markers.len());
        markers.push(self.station_marker.clone());
        markers.extend(alert_markers.iter().cloned());

        MapRender {
            center: self.station_marker.position,
            zoom: self.zoom,
            tile_url: self.tile_url.clone(),
            coverage: self.coverage.clone(),
            markers,
        }
    }
}

impl AlertObserver for MapView {
    fn on_change(&self, change: &StoreChange) {
        let marker = self.alert_marker(&change.alert);
        let mut markers = self
            .alert_markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        markers.push_front(marker);
        if change.evicted.is_some() {
            markers.pop_back();
        }
    }
}
