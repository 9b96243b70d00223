//! Connection manager: one live alert channel per mounted dashboard

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::protocol::{EVENT_INCOMING_ALERT, EVENT_JOIN_STATION};
use crate::store::AlertStore;
use crate::transport::{ChannelEvent, Transport};

/// Upper bound on how long closing waits for the channel task
const CLOSE_GRACE: Duration = Duration::from_secs(3);

/// Whether the alert channel is currently connected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// A running alert channel
///
/// Dropping the channel cancels it, so it never outlives its owner.
pub struct AlertChannel {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    status: watch::Receiver<ConnectionStatus>,
}

impl fmt::Debug for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertChannel")
            .field("status", &*self.status.borrow())
            .field("open", &self.task.is_some())
            .finish()
    }
}

impl AlertChannel {
    /// Start the channel task. Must be called from within a tokio runtime.
    pub fn open<T>(transport: T, station_id: String, store: AlertStore) -> Self
    where
        T: Transport + 'static,
    {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tracing::debug!("Opening alert channel for station {}", station_id);
        let task = tokio::spawn(async move {
            run_channel(transport, station_id, store, status_tx, task_cancel).await;
        });

        Self {
            cancel,
            task: Some(task),
            status: status_rx,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn is_open(&self) -> bool {
        self.task.is_some()
    }

    /// Close the channel, giving the transport a bounded time to shut down.
    ///
    /// Returns false when the channel was already closed.
    pub async fn close(&mut self) -> bool {
        self.close_within(CLOSE_GRACE).await
    }

    async fn close_within(&mut self, grace: Duration) -> bool {
        let Some(mut task) = self.task.take() else {
            return false;
        };
        self.cancel.cancel();
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Alert channel task ended abnormally: {}", e),
            Err(_) => {
                tracing::warn!("Alert channel did not close within {:?}, aborting", grace);
                task.abort();
            }
        }
        true
    }
}

impl Drop for AlertChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_channel<T: Transport>(
    mut transport: T,
    station_id: String,
    store: AlertStore,
    status: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Alert channel cancelled, closing transport");
                transport.close().await;
                break;
            }
            event = transport.next_event() => match event {
                Some(event) => handle_event(&mut transport, event, &station_id, &store, &status).await,
                None => {
                    tracing::info!("Alert channel finished");
                    break;
                }
            }
        }
    }
    status.send_replace(ConnectionStatus::Disconnected);
}

/// Apply one channel event to the status flag and the store
pub async fn handle_event<T: Transport + ?Sized>(
    transport: &mut T,
    event: ChannelEvent,
    station_id: &str,
    store: &AlertStore,
    status: &watch::Sender<ConnectionStatus>,
) {
    tracing::trace!("Alert channel event '{}'", event.name());
    match event {
        ChannelEvent::Connected => {
            tracing::info!("Connected to alert channel, joining station {}", station_id);
            if let Err(e) = transport
                .emit(EVENT_JOIN_STATION, vec![Value::String(station_id.to_string())])
                .await
            {
                tracing::warn!("Failed to join station {}: {}", station_id, e);
            }
            status.send_replace(ConnectionStatus::Connected);
        }
        ChannelEvent::Disconnected { reason } => {
            tracing::info!("Disconnected from alert channel: {}", reason);
            status.send_replace(ConnectionStatus::Disconnected);
        }
        ChannelEvent::Event { name, args } if name == EVENT_INCOMING_ALERT => {
            let Some(payload) = args.first() else {
                tracing::warn!("Dropping {} event without payload", EVENT_INCOMING_ALERT);
                return;
            };
            match Alert::from_payload(payload) {
                Ok(alert) => {
                    tracing::debug!(
                        "New alert received: {} at {}",
                        alert.event_type,
                        alert.timestamp_utc
                    );
                    store.append(alert);
                }
                Err(e) => tracing::warn!("Dropping malformed alert {}: {}", payload, e),
            }
        }
        ChannelEvent::Event { name, .. } => {
            tracing::debug!("Ignoring unhandled event '{}'", name);
        }
    }
}
