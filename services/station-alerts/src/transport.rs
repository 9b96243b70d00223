//! Real-time channel transport abstraction for testability

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::BackendConfig;
use crate::protocol::{
    Endpoint, EnginePacket, Handshake, SocketPacket, EVENT_CONNECT, EVENT_DISCONNECT,
};
use crate::AlertsError;

/// Time allowed for the Engine.IO open packet after the socket connects
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

/// Time allowed for the disconnect packet and close frame on teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Something that happened on the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The server acknowledged the namespace connection
    Connected,
    /// An established connection went away
    Disconnected { reason: String },
    /// A named server push
    Event { name: String, args: Vec<Value> },
}

impl ChannelEvent {
    /// Event name as the Socket.IO client reports it
    pub fn name(&self) -> &str {
        match self {
            ChannelEvent::Connected => EVENT_CONNECT,
            ChannelEvent::Disconnected { .. } => EVENT_DISCONNECT,
            ChannelEvent::Event { name, .. } => name,
        }
    }
}

/// Duplex channel to the alert backend
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Wait for the next channel event; `None` once the channel is finished
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    /// Send a named event with arguments
    async fn emit(&mut self, event: &str, args: Vec<Value>) -> crate::Result<()>;

    /// Close the channel for good
    async fn close(&mut self);
}

/// Exponential reconnect schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(backend: &BackendConfig) -> Self {
        Self {
            enabled: backend.reconnect,
            initial_delay: backend.reconnect_delay(),
            max_delay: backend.reconnect_delay_max(),
        }
    }

    /// Delay before reconnect attempt number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum ConnState {
    Idle,
    Open {
        stream: Box<WsStream>,
        idle_timeout: Duration,
        connected: bool,
    },
    Closed,
}

/// Socket.IO client over a tokio-tungstenite WebSocket
pub struct SocketIoTransport {
    endpoint: Endpoint,
    reconnect: ReconnectPolicy,
    state: ConnState,
    /// Consecutive connections lost before the namespace was acknowledged,
    /// or 1 after losing an acknowledged one
    failures: u32,
}

impl std::fmt::Debug for SocketIoTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketIoTransport")
            .field("url", &self.endpoint.url.as_str())
            .field("namespace", &self.endpoint.namespace)
            .finish()
    }
}

impl SocketIoTransport {
    pub fn new(backend: &BackendConfig) -> crate::Result<Self> {
        let endpoint = Endpoint::from_backend_url(&backend.url)?;
        tracing::debug!(
            "Created SocketIoTransport for {} (namespace {})",
            endpoint.url,
            endpoint.namespace
        );
        Ok(Self {
            endpoint,
            reconnect: ReconnectPolicy::from_config(backend),
            state: ConnState::Idle,
            failures: 0,
        })
    }

    /// Open the WebSocket, read the handshake and request the namespace
    async fn open(&self) -> crate::Result<(Box<WsStream>, Handshake)> {
        tracing::debug!("Connecting to {}", self.endpoint.url);
        let (mut stream, _) = tokio_tungstenite::connect_async(self.endpoint.url.as_str())
            .await
            .map_err(|e| {
                AlertsError::Transport(format!("connect {} failed: {}", self.endpoint.url, e))
            })?;

        let handshake = loop {
            let frame = tokio::time::timeout(HANDSHAKE_TIMEOUT, stream.next())
                .await
                .map_err(|_| AlertsError::Transport("handshake timed out".to_string()))?;
            match frame {
                Some(Ok(Message::Text(text))) => match EnginePacket::decode(text.as_str())? {
                    EnginePacket::Open(handshake) => break handshake,
                    other => {
                        return Err(AlertsError::Protocol(format!(
                            "expected open packet, got {:?}",
                            other
                        )))
                    }
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(other)) => {
                    return Err(AlertsError::Protocol(format!(
                        "unexpected frame during handshake: {:?}",
                        other
                    )))
                }
                Some(Err(e)) => {
                    return Err(AlertsError::Transport(format!("handshake read failed: {}", e)))
                }
                None => {
                    return Err(AlertsError::Transport(
                        "socket closed during handshake".to_string(),
                    ))
                }
            }
        };

        tracing::debug!(
            "Engine.IO session {} (ping interval {} ms, timeout {} ms)",
            handshake.sid,
            handshake.ping_interval,
            handshake.ping_timeout
        );

        let connect = EnginePacket::Message(SocketPacket::connect(&self.endpoint.namespace).encode());
        stream
            .send(Message::Text(connect.encode().into()))
            .await
            .map_err(|e| AlertsError::Transport(format!("namespace connect failed: {}", e)))?;

        Ok((Box::new(stream), handshake))
    }

    /// Drop the current socket and schedule a reconnect when allowed
    fn connection_lost(&mut self, was_connected: bool) {
        self.failures = if was_connected {
            1
        } else {
            self.failures.saturating_add(1)
        };
        self.state = if self.reconnect.enabled {
            ConnState::Idle
        } else {
            ConnState::Closed
        };
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            match &mut self.state {
                ConnState::Closed => return None,

                ConnState::Idle => {
                    let attempt = self.failures;
                    if attempt > 0 {
                        let delay = self.reconnect.delay(attempt);
                        tracing::debug!("Reconnect attempt {} in {:?}", attempt, delay);
                        tokio::time::sleep(delay).await;
                    }
                    match self.open().await {
                        Ok((stream, handshake)) => {
                            self.state = ConnState::Open {
                                stream,
                                idle_timeout: Duration::from_millis(
                                    handshake.ping_interval + handshake.ping_timeout,
                                ),
                                connected: false,
                            };
                        }
                        Err(e) => {
                            tracing::warn!("Alert channel connection failed: {}", e);
                            self.connection_lost(false);
                        }
                    }
                }

                ConnState::Open {
                    stream,
                    idle_timeout,
                    connected,
                } => {
                    let was_connected = *connected;
                    let frame = match tokio::time::timeout(*idle_timeout, stream.next()).await {
                        Ok(frame) => frame,
                        Err(_) => {
                            tracing::warn!("Alert channel ping timeout");
                            self.connection_lost(was_connected);
                            if was_connected {
                                return Some(ChannelEvent::Disconnected {
                                    reason: "ping timeout".to_string(),
                                });
                            }
                            continue;
                        }
                    };

                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => {
                            self.connection_lost(was_connected);
                            if was_connected {
                                return Some(ChannelEvent::Disconnected {
                                    reason: "transport close".to_string(),
                                });
                            }
                            continue;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::warn!("Alert channel read failed: {}", e);
                            self.connection_lost(was_connected);
                            if was_connected {
                                return Some(ChannelEvent::Disconnected {
                                    reason: "transport error".to_string(),
                                });
                            }
                            continue;
                        }
                    };

                    let packet = match EnginePacket::decode(text.as_str()) {
                        Ok(packet) => packet,
                        Err(e) => {
                            tracing::warn!("Ignoring undecodable frame: {}", e);
                            continue;
                        }
                    };

                    match packet {
                        EnginePacket::Ping(data) => {
                            let pong = EnginePacket::Pong(data).encode();
                            if let Err(e) = stream.send(Message::Text(pong.into())).await {
                                tracing::warn!("Failed to answer ping: {}", e);
                            }
                        }
                        EnginePacket::Close => {
                            self.connection_lost(was_connected);
                            if was_connected {
                                return Some(ChannelEvent::Disconnected {
                                    reason: "transport close".to_string(),
                                });
                            }
                        }
                        EnginePacket::Message(payload) => {
                            let packet = match SocketPacket::decode(&payload) {
                                Ok(packet) => packet,
                                Err(e) => {
                                    tracing::warn!("Ignoring undecodable packet: {}", e);
                                    continue;
                                }
                            };
                            if packet.namespace() != self.endpoint.namespace {
                                tracing::debug!(
                                    "Ignoring packet for namespace {}",
                                    packet.namespace()
                                );
                                continue;
                            }
                            match packet {
                                SocketPacket::Connect { .. } => {
                                    *connected = true;
                                    self.failures = 0;
                                    return Some(ChannelEvent::Connected);
                                }
                                SocketPacket::Event { name, args, .. } => {
                                    return Some(ChannelEvent::Event { name, args });
                                }
                                SocketPacket::Disconnect { .. } => {
                                    // Server-initiated disconnects are final
                                    tracing::info!("Alert channel closed by server");
                                    self.state = ConnState::Closed;
                                    return Some(ChannelEvent::Disconnected {
                                        reason: "io server disconnect".to_string(),
                                    });
                                }
                                SocketPacket::ConnectError { message, .. } => {
                                    tracing::warn!("Alert channel connect refused: {}", message);
                                    self.connection_lost(was_connected);
                                }
                                SocketPacket::Ack { .. } => {}
                            }
                        }
                        EnginePacket::Open(_)
                        | EnginePacket::Pong(_)
                        | EnginePacket::Upgrade
                        | EnginePacket::Noop => {}
                    }
                }
            }
        }
    }

    async fn emit(&mut self, event: &str, args: Vec<Value>) -> crate::Result<()> {
        let ConnState::Open {
            stream,
            connected: true,
            ..
        } = &mut self.state
        else {
            return Err(AlertsError::Transport(format!(
                "cannot emit '{}' while disconnected",
                event
            )));
        };

        let packet = SocketPacket::event(&self.endpoint.namespace, event, args);
        let frame = EnginePacket::Message(packet.encode()).encode();
        tracing::debug!("Emitting {}", frame);
        stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| AlertsError::Transport(format!("emit '{}' failed: {}", event, e)))
    }

    async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnState::Closed);
        if let ConnState::Open { mut stream, .. } = state {
            let disconnect = SocketPacket::Disconnect {
                namespace: self.endpoint.namespace.clone(),
            };
            let frame = EnginePacket::Message(disconnect.encode()).encode();
            let shutdown = async {
                if let Err(e) = stream.send(Message::Text(frame.into())).await {
                    tracing::debug!("Failed to send disconnect packet: {}", e);
                }
                if let Err(e) = (*stream).close(None).await {
                    tracing::debug!("Failed to close WebSocket: {}", e);
                }
            };
            if tokio::time::timeout(CLOSE_TIMEOUT, shutdown).await.is_err() {
                tracing::warn!("Alert channel peer stalled during close, dropping socket");
            }
        }
        tracing::debug!("Alert channel transport closed");
    }
}
