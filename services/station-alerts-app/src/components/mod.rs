pub mod alert_list;
pub mod alert_markers;
pub mod connection_badge;
