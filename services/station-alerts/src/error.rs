//! Error types for the station alerts service

/// Errors that can occur in the station alerts service
#[derive(Debug, thiserror::Error)]
pub enum AlertsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid alert: {0}")]
    InvalidAlert(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for station alerts operations
pub type Result<T> = std::result::Result<T, AlertsError>;
