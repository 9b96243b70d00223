//! Newest-first alert list

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::store::{AlertObserver, StoreChange};
use crate::views::{format_coordinates, TimeFormatter, LIST_COORDINATE_PRECISION};

/// Shown when no alert has arrived yet
pub const EMPTY_PLACEHOLDER: &str = "No alerts yet. Waiting for incoming alerts...";

/// One rendered list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub label: String,
    pub color: String,
    pub time: String,
    pub coordinates: String,
    /// Only the head of the list is new
    pub is_new: bool,
}

/// What the list shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListRender {
    Empty { placeholder: String },
    Items { items: Vec<ListItem> },
}

impl ListRender {
    pub fn items(&self) -> &[ListItem] {
        match self {
            ListRender::Empty { .. } => &[],
            ListRender::Items { items } => items,
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    label: String,
    color: String,
    time: String,
    coordinates: String,
}

/// Vertical alert list kept in sync with the store
#[derive(Debug)]
pub struct ListView {
    formatter: TimeFormatter,
    rows: Mutex<VecDeque<Row>>,
}

impl ListView {
    pub fn new(formatter: TimeFormatter) -> Self {
        Self {
            formatter,
            rows: Mutex::new(VecDeque::new()),
        }
    }

    fn row(&self, alert: &Alert) -> Row {
        Row {
            label: alert.event_type.clone(),
            color: alert.color().to_string(),
            time: self.formatter.format(&alert.timestamp_utc),
            coordinates: format_coordinates(&alert.location, LIST_COORDINATE_PRECISION),
        }
    }

    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self) -> ListRender {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        if rows.is_empty() {
            return ListRender::Empty {
                placeholder: EMPTY_PLACEHOLDER.to_string(),
            };
        }
        let items = rows
            .iter()
            .enumerate()
            .map(|(index, row)| ListItem {
                label: row.label.clone(),
                color: row.color.clone(),
                time: row.time.clone(),
                coordinates: row.coordinates.clone(),
                is_new: index == 0,
            })
            .collect();
        ListRender::Items { items }
    }
}

impl AlertObserver for ListView {
    fn on_change(&self, change: &StoreChange) {
        let row = self.row(&change.alert);
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.push_front(row);
        if change.evicted.is_some() {
            rows.pop_back();
        }
    }
}
