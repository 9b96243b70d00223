//! BDD test world for station alerts service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cucumber::World;
use serde_json::Value;
use tokio::sync::mpsc;

use station_alerts::config::Config;
use station_alerts::session::DashboardSession;
use station_alerts::transport::{ChannelEvent, Transport};

/// Emitted events recorded by the scripted transport
pub type EmitLog = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

/// A transport driven by the test, recording what the dashboard sends
#[derive(Debug)]
pub struct ScriptedTransport {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    emitted: EmitLog,
    polls: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.events.recv().await
    }

    async fn emit(&mut self, event: &str, args: Vec<Value>) -> station_alerts::Result<()> {
        self.emitted
            .lock()
            .unwrap()
            .push((event.to_string(), args));
        Ok(())
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test-side handles to one mounted dashboard
#[derive(Debug)]
pub struct Mount {
    pub session: DashboardSession,
    pub events: mpsc::UnboundedSender<ChannelEvent>,
    pub emitted: EmitLog,
    pub polls: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub sent: usize,
}

impl Mount {
    pub fn new(config: &Config) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let emitted: EmitLog = Arc::new(Mutex::new(Vec::new()));
        let polls = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let transport = ScriptedTransport {
            events: rx,
            emitted: Arc::clone(&emitted),
            polls: Arc::clone(&polls),
            closes: Arc::clone(&closes),
        };
        Self {
            session: DashboardSession::mount(config, transport),
            events,
            emitted,
            polls,
            closes,
            sent: 0,
        }
    }

    /// Push an event and wait until the channel task has fully handled it
    pub async fn deliver(&mut self, event: ChannelEvent) {
        self.events.send(event).expect("channel task is gone");
        self.sent += 1;
        for _ in 0..1000 {
            if self.polls.load(Ordering::SeqCst) > self.sent {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("channel task did not handle event {}", self.sent);
    }
}

#[derive(Debug, Default, World)]
pub struct AlertsWorld {
    pub config: Option<Config>,
    pub mount: Option<Mount>,
    pub closes_per_cycle: Vec<usize>,
    pub dashboard_response_body: Option<String>,
}

impl AlertsWorld {
    pub fn mount(&mut self) -> &mut Mount {
        self.mount.as_mut().expect("dashboard not mounted")
    }
}
