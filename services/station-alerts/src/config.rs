//! Configuration types for the station alerts service

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::views::icons::IconDescriptor;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// The monitoring station this dashboard belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default = "default_station_id")]
    pub id: String,
    #[serde(default = "default_station_latitude")]
    pub latitude: f64,
    #[serde(default = "default_station_longitude")]
    pub longitude: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            id: default_station_id(),
            latitude: default_station_latitude(),
            longitude: default_station_longitude(),
        }
    }
}

/// Real-time backend the alert channel connects to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_true")]
    pub reconnect: bool,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_reconnect_delay_max_ms")]
    pub reconnect_delay_max_ms: u64,
}

impl BackendConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn reconnect_delay_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_max_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            reconnect: true,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_delay_max_ms: default_reconnect_delay_max_ms(),
        }
    }
}

/// Map rendering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_coverage_radius_m")]
    pub coverage_radius_m: f64,
    /// Icon overrides keyed by marker role (`station`, `alert`, `alert-<classification>`)
    #[serde(default)]
    pub icons: HashMap<String, IconDescriptor>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            coverage_radius_m: default_coverage_radius_m(),
            icons: HashMap::new(),
        }
    }
}

/// Timestamp display settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Fixed UTC offset for rendered timestamps; the host's local zone when absent
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Alert retention
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of retained alerts; unbounded when absent
    #[serde(default)]
    pub max_alerts: Option<usize>,
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_station_id() -> String {
    "68fe58d6b0003e04b9274296".to_string()
}

fn default_station_latitude() -> f64 {
    19.206314
}

fn default_station_longitude() -> f64 {
    72.872836
}

fn default_backend_url() -> String {
    "https://smart-surveillance-system-backend-japk.onrender.com".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_reconnect_delay_max_ms() -> u64 {
    5000
}

fn default_zoom() -> u8 {
    14
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_coverage_radius_m() -> f64 {
    500.0
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::AlertsError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject values that would make the dashboard meaningless
    pub fn validate(&self) -> crate::Result<()> {
        if self.station.id.trim().is_empty() {
            return Err(crate::AlertsError::Config(
                "station.id must not be empty".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.station.latitude)
            || !(-180.0..=180.0).contains(&self.station.longitude)
        {
            return Err(crate::AlertsError::Config(format!(
                "station coordinates out of range: {}, {}",
                self.station.latitude, self.station.longitude
            )));
        }
        if self.store.max_alerts == Some(0) {
            return Err(crate::AlertsError::Config(
                "store.max_alerts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
