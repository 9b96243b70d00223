//! Render models derived from the alert store
//!
//! Each view is an [`AlertObserver`] that keeps its own rendered rows in
//! sync with the store. [`Mounted`] ties a view's subscription to its
//! mount/unmount lifecycle.

pub mod icons;
pub mod list;
pub mod map;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::alert::Location;
use crate::config::DisplayConfig;
use crate::store::{AlertObserver, AlertStore, Subscription};

/// Decimal places for coordinates in the alert list
pub const LIST_COORDINATE_PRECISION: usize = 4;

/// Decimal places for coordinates in map popups
pub const POPUP_COORDINATE_PRECISION: usize = 6;

// Mirrors the en-US `Date.toLocaleString()` layout
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Converts alert instants into display strings
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeFormatter {
    offset: Option<FixedOffset>,
}

impl TimeFormatter {
    /// Format in the host's local time zone
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Format at a fixed offset from UTC
    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        match display.utc_offset_minutes {
            None => Self::local(),
            Some(minutes) => match FixedOffset::east_opt(minutes * 60) {
                Some(offset) => Self::fixed(offset),
                None => {
                    tracing::warn!(
                        "Ignoring invalid display.utc_offset_minutes {}, using local time",
                        minutes
                    );
                    Self::local()
                }
            },
        }
    }

    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        match self.offset {
            Some(offset) => instant
                .with_timezone(&offset)
                .format(DISPLAY_FORMAT)
                .to_string(),
            None => instant
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
        }
    }
}

/// `lat, lon` with a fixed number of decimal places
pub fn format_coordinates(location: &Location, precision: usize) -> String {
    format!(
        "{:.*}, {:.*}",
        precision, location.lat, precision, location.lon
    )
}

/// A view subscribed to a store for as long as it stays mounted
pub struct Mounted<V> {
    view: Arc<V>,
    subscription: Option<Subscription>,
}

impl<V: AlertObserver + 'static> Mounted<V> {
    pub fn mount(store: &AlertStore, view: V) -> Self {
        let view = Arc::new(view);
        let subscription = store.subscribe(Arc::clone(&view) as Arc<dyn AlertObserver>);
        Self {
            view,
            subscription: Some(subscription),
        }
    }
}

impl<V> Mounted<V> {
    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop receiving store changes; returns false if already unmounted
    pub fn unmount(&mut self) -> bool {
        match self.subscription.take() {
            Some(subscription) => {
                subscription.unsubscribe();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_like_locale_string() {
        let formatter = TimeFormatter::fixed(FixedOffset::east_opt(0).unwrap());
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(formatter.format(&instant), "1/1/2024, 10:00:00 AM");

        let evening = Utc.with_ymd_and_hms(2024, 12, 31, 23, 5, 9).unwrap();
        assert_eq!(formatter.format(&evening), "12/31/2024, 11:05:09 PM");
    }

    #[test]
    fn applies_configured_offset() {
        let formatter = TimeFormatter::from_config(&DisplayConfig {
            utc_offset_minutes: Some(330),
        });
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(formatter.format(&instant), "1/1/2024, 3:30:00 PM");
    }

    #[test]
    fn invalid_offset_falls_back_to_local() {
        let formatter = TimeFormatter::from_config(&DisplayConfig {
            utc_offset_minutes: Some(100_000),
        });
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            formatter.format(&instant),
            TimeFormatter::local().format(&instant)
        );
    }

    #[test]
    fn coordinate_precision() {
        let location = Location { lat: 19.0, lon: 72.8 };
        assert_eq!(
            format_coordinates(&location, LIST_COORDINATE_PRECISION),
            "19.0000, 72.8000"
        );
        assert_eq!(
            format_coordinates(&location, POPUP_COORDINATE_PRECISION),
            "19.000000, 72.800000"
        );
    }
}
