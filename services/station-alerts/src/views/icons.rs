//! Marker icons, keyed by marker role

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const LEAFLET_IMAGES: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.7.1/images";
const COLOR_MARKERS: &str =
    "https://raw.githubusercontent.com/pointhi/leaflet-color-markers/master/img";

/// Which kind of thing a map marker stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRole {
    Station,
    Alert { classification: String },
}

impl MarkerRole {
    pub fn alert(classification: &str) -> Self {
        MarkerRole::Alert {
            classification: classification.to_ascii_lowercase(),
        }
    }

    /// Registry key: `station` or `alert-<classification>`
    pub fn key(&self) -> String {
        match self {
            MarkerRole::Station => "station".to_string(),
            MarkerRole::Alert { classification } => format!("alert-{}", classification),
        }
    }
}

/// Everything the map needs to draw a marker image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDescriptor {
    pub icon_url: String,
    #[serde(default)]
    pub icon_retina_url: Option<String>,
    #[serde(default = "default_shadow_url")]
    pub shadow_url: Option<String>,
    #[serde(default = "default_icon_size")]
    pub icon_size: [u32; 2],
    #[serde(default = "default_icon_anchor")]
    pub icon_anchor: [i32; 2],
    #[serde(default = "default_popup_anchor")]
    pub popup_anchor: [i32; 2],
    #[serde(default)]
    pub color: Option<String>,
}

fn default_shadow_url() -> Option<String> {
    Some(format!("{}/marker-shadow.png", LEAFLET_IMAGES))
}

fn default_icon_size() -> [u32; 2] {
    [25, 41]
}

fn default_icon_anchor() -> [i32; 2] {
    [12, 41]
}

fn default_popup_anchor() -> [i32; 2] {
    [1, -34]
}

impl IconDescriptor {
    fn leaflet_default(color: &str) -> Self {
        Self {
            icon_url: format!("{}/marker-icon.png", LEAFLET_IMAGES),
            icon_retina_url: Some(format!("{}/marker-icon-2x.png", LEAFLET_IMAGES)),
            shadow_url: default_shadow_url(),
            icon_size: default_icon_size(),
            icon_anchor: default_icon_anchor(),
            popup_anchor: default_popup_anchor(),
            color: Some(color.to_string()),
        }
    }

    fn colored(variant: &str, color: &str) -> Self {
        Self {
            icon_url: format!("{}/marker-icon-{}.png", COLOR_MARKERS, variant),
            icon_retina_url: Some(format!("{}/marker-icon-2x-{}.png", COLOR_MARKERS, variant)),
            shadow_url: default_shadow_url(),
            icon_size: default_icon_size(),
            icon_anchor: default_icon_anchor(),
            popup_anchor: default_popup_anchor(),
            color: Some(color.to_string()),
        }
    }
}

/// Icon lookup handed to the map view at construction
#[derive(Debug, Clone)]
pub struct IconRegistry {
    icons: HashMap<String, IconDescriptor>,
}

impl Default for IconRegistry {
    fn default() -> Self {
        let mut icons = HashMap::new();
        icons.insert(
            "station".to_string(),
            IconDescriptor::leaflet_default("#2563eb"),
        );
        icons.insert("alert".to_string(), IconDescriptor::colored("red", "#dc2626"));
        icons.insert(
            "alert-violence".to_string(),
            IconDescriptor::colored("red", "#dc2626"),
        );
        icons.insert(
            "alert-theft".to_string(),
            IconDescriptor::colored("orange", "#ea580c"),
        );
        icons.insert(
            "alert-suspicious".to_string(),
            IconDescriptor::colored("yellow", "#eab308"),
        );
        icons.insert(
            "alert-emergency".to_string(),
            IconDescriptor::colored("black", "#991b1b"),
        );
        Self { icons }
    }
}

impl IconRegistry {
    /// Defaults with configured entries layered on top
    pub fn with_overrides(overrides: &HashMap<String, IconDescriptor>) -> Self {
        let mut registry = Self::default();
        for (role, icon) in overrides {
            registry.icons.insert(role.to_ascii_lowercase(), icon.clone());
        }
        registry
    }

    /// Exact role first, then the generic `alert` icon for alert roles
    pub fn resolve(&self, role: &MarkerRole) -> &IconDescriptor {
        let generic = match role {
            MarkerRole::Station => "station",
            MarkerRole::Alert { .. } => "alert",
        };
        self.icons
            .get(&role.key())
            .or_else(|| self.icons.get(generic))
            .unwrap_or(&DEFAULT_ICON)
    }
}

static DEFAULT_ICON: std::sync::LazyLock<IconDescriptor> =
    std::sync::LazyLock::new(|| IconDescriptor::leaflet_default("#dc2626"));
