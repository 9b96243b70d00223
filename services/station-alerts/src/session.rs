//! Mounted dashboard: channel, store and views sharing one lifetime

use std::sync::Arc;

use tokio::sync::watch;

use crate::channel::{AlertChannel, ConnectionStatus};
use crate::config::Config;
use crate::store::AlertStore;
use crate::transport::Transport;
use crate::views::icons::IconRegistry;
use crate::views::list::ListView;
use crate::views::map::MapView;
use crate::views::{Mounted, TimeFormatter};

/// One mounted station dashboard
///
/// Mounting opens the alert channel and subscribes both views to a fresh
/// store. Unmounting closes the channel exactly once and unsubscribes the
/// views; dropping without unmounting still cancels the channel.
pub struct DashboardSession {
    station_id: String,
    store: AlertStore,
    list: Mounted<ListView>,
    map: Mounted<MapView>,
    channel: AlertChannel,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("station_id", &self.station_id)
            .field("store", &self.store)
            .field("channel", &self.channel)
            .finish()
    }
}

impl DashboardSession {
    pub fn mount<T>(config: &Config, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let formatter = TimeFormatter::from_config(&config.display);
        let store = AlertStore::new(config.store.max_alerts);

        let list = Mounted::mount(&store, ListView::new(formatter));
        let map = Mounted::mount(
            &store,
            MapView::new(
                &config.station,
                &config.map,
                IconRegistry::with_overrides(&config.map.icons),
                formatter,
            ),
        );

        let channel = AlertChannel::open(transport, config.station.id.clone(), store.clone());
        tracing::info!("Dashboard mounted for station {}", config.station.id);

        Self {
            station_id: config.station.id.clone(),
            store,
            list,
            map,
            channel,
        }
    }

    /// Close the channel and detach the views; returns false if already unmounted
    pub async fn unmount(&mut self) -> bool {
        if !self.channel.close().await {
            return false;
        }
        self.list.unmount();
        self.map.unmount();
        tracing::info!("Dashboard unmounted for station {}", self.station_id);
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.channel.is_open()
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    pub fn list(&self) -> &Arc<ListView> {
        self.list.view()
    }

    pub fn map(&self) -> &Arc<MapView> {
        self.map.view()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.channel.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.channel.subscribe_status()
    }
}
