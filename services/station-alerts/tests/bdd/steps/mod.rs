//! BDD step definitions for station alerts service

pub mod alert_steps;
pub mod classification_steps;
pub mod connection_steps;
pub mod dashboard_steps;
