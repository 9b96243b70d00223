//! Alert records pushed by the backend

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Fallback marker color for unknown classifications
pub const DEFAULT_ALERT_COLOR: &str = "#dc2626";

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// A detected event pushed over the alert channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event_type: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp_utc: DateTime<Utc>,
    pub location: Location,
}

impl Alert {
    /// Build an alert from a raw `incoming_alert` payload, rejecting anything
    /// that could not be rendered.
    pub fn from_payload(payload: &serde_json::Value) -> crate::Result<Self> {
        let alert: Alert = serde_json::from_value(payload.clone())
            .map_err(|e| crate::AlertsError::InvalidAlert(e.to_string()))?;
        alert.validate()?;
        Ok(alert)
    }

    fn validate(&self) -> crate::Result<()> {
        let Location { lat, lon } = self.location;
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(crate::AlertsError::InvalidAlert(format!(
                "latitude out of range: {}",
                lat
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(crate::AlertsError::InvalidAlert(format!(
                "longitude out of range: {}",
                lon
            )));
        }
        Ok(())
    }

    /// Marker/label color for this alert's classification
    pub fn color(&self) -> &'static str {
        classification_color(&self.event_type)
    }
}

/// Map a classification to its display color, case-insensitively
pub fn classification_color(event_type: &str) -> &'static str {
    match event_type.to_ascii_lowercase().as_str() {
        "violence" => "#dc2626",
        "theft" => "#ea580c",
        "suspicious" => "#eab308",
        "emergency" => "#991b1b",
        _ => DEFAULT_ALERT_COLOR,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    EpochMillis(i64),
    FractionalEpochMillis(f64),
}

/// Naive layouts taken as UTC, tried after RFC 3339
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accepts RFC 3339 strings, offset-less ISO date-times and dates (taken as
/// UTC) and epoch milliseconds, integral or fractional
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("unparseable timestamp: {}", text))),
        RawTimestamp::EpochMillis(ms) => from_epoch_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
        RawTimestamp::FractionalEpochMillis(ms) => {
            // Sub-millisecond precision is truncated
            let whole = if ms.is_finite() {
                from_epoch_millis(ms.trunc() as i64)
            } else {
                None
            };
            whole.ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms)))
        }
    }
}

fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
