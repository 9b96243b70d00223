//! Station Alerts - live security alert dashboard
//!
//! Joins a station's room on the alert backend, keeps every pushed alert in a
//! newest-first store, and serves it as a list and a map.

pub mod alert;
pub mod channel;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;
pub mod transport;
pub mod views;

pub use config::{load_config, Config};
pub use error::{AlertsError, Result};

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::session::DashboardSession;
use crate::transport::SocketIoTransport;

/// Run the station alerts service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let transport = SocketIoTransport::new(&config.backend)?;
    let cancel = CancellationToken::new();

    let mut session = DashboardSession::mount(&config, transport);

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    // Start dashboard if enabled
    let dashboard_task = if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = dashboard::DashboardState::from_session(&session);
        let cancel_for_dashboard = cancel.clone();

        Some(tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    let err = AlertsError::Dashboard(format!(
                        "failed to bind port {}: {}",
                        dashboard_port, e
                    ));
                    tracing::error!("{}. Continuing without dashboard.", err);
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        }))
    } else {
        None
    };

    tracing::info!("Station alerts started for station {}", config.station.id);

    cancel.cancelled().await;

    session.unmount().await;
    if let Some(task) = dashboard_task {
        let _ = task.await;
    }
    tracing::info!("Station alerts stopped");

    Ok(())
}
