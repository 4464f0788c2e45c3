//! Channel seams and their ZeroMQ implementation
//!
//! The agent talks to three endpoints: a REQ/REP lobby, a SUB socket on the
//! state broadcast filtered by game id, and a fire-and-forget PUSH control
//! socket. Everything above this module is generic over [`Connector`] so
//! sessions can be driven by in-memory doubles in tests.

#![allow(async_fn_in_trait)]

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::lookup_host;
use tracing::{debug, info, warn};
use zeromq::{PushSocket, ReqSocket, Socket, SocketRecv, SocketSend, SubSocket, ZmqMessage};

use super::TransportError;

/// One state broadcast: filter tag then JSON payload
#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub tag: Bytes,
    pub payload: Bytes,
}

/// Request/reply registration channel
pub trait Lobby {
    async fn request(&mut self, payload: Bytes) -> Result<Bytes, TransportError>;
}

/// Subscription to state broadcasts for one filter
pub trait StateFeed {
    /// Wait for the next message whose tag starts with the filter
    async fn recv(&mut self) -> Result<StateMessage, TransportError>;

    /// Release the subscription
    async fn close(&mut self);
}

/// Fire-and-forget control channel
pub trait ControlSink {
    async fn send(&mut self, line: &str) -> Result<(), TransportError>;

    /// Release the channel
    async fn close(&mut self);
}

/// Opens the three channels against one server
pub trait Connector {
    type Lobby: Lobby;
    type Feed: StateFeed;
    type Control: ControlSink;

    async fn lobby(&self) -> Result<Self::Lobby, TransportError>;
    async fn subscribe(&self, filter: &str) -> Result<Self::Feed, TransportError>;
    async fn control(&self) -> Result<Self::Control, TransportError>;
}

/// ZeroMQ endpoints resolved once at startup
#[derive(Debug, Clone)]
pub struct ZmqConnector {
    lobby_endpoint: String,
    state_endpoint: String,
    control_endpoint: String,
}

impl ZmqConnector {
    pub fn new(lobby_addr: SocketAddr, state_addr: SocketAddr, control_addr: SocketAddr) -> Self {
        Self {
            lobby_endpoint: tcp_endpoint(lobby_addr),
            state_endpoint: tcp_endpoint(state_addr),
            control_endpoint: tcp_endpoint(control_addr),
        }
    }

    /// Resolve `host` for all three ports
    pub async fn resolve(
        host: &str,
        lobby_port: u16,
        state_port: u16,
        control_port: u16,
    ) -> Result<Self, TransportError> {
        Ok(Self::new(
            resolve_one(host, lobby_port).await?,
            resolve_one(host, state_port).await?,
            resolve_one(host, control_port).await?,
        ))
    }
}

fn tcp_endpoint(addr: SocketAddr) -> String {
    format!("tcp://{}", addr)
}

async fn resolve_one(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let resolve_err = || TransportError::Resolve {
        host: host.to_string(),
        port,
    };
    lookup_host((host, port))
        .await
        .map_err(|_| resolve_err())?
        .next()
        .ok_or_else(resolve_err)
}

impl Connector for ZmqConnector {
    type Lobby = ZmqLobby;
    type Feed = ZmqStateFeed;
    type Control = ZmqControl;

    async fn lobby(&self) -> Result<ZmqLobby, TransportError> {
        info!(endpoint = %self.lobby_endpoint, "Connecting to lobby");
        let mut socket = ReqSocket::new();
        socket.connect(&self.lobby_endpoint).await?;
        Ok(ZmqLobby { socket })
    }

    async fn subscribe(&self, filter: &str) -> Result<ZmqStateFeed, TransportError> {
        info!(endpoint = %self.state_endpoint, filter = %filter, "Connecting to state channel");
        let mut socket = SubSocket::new();
        socket.connect(&self.state_endpoint).await?;
        socket.subscribe(filter).await?;
        Ok(ZmqStateFeed {
            socket: Some(socket),
            filter: Bytes::copy_from_slice(filter.as_bytes()),
        })
    }

    async fn control(&self) -> Result<ZmqControl, TransportError> {
        info!(endpoint = %self.control_endpoint, "Connecting to control channel");
        let mut socket = PushSocket::new();
        socket.connect(&self.control_endpoint).await?;
        Ok(ZmqControl {
            socket: Some(socket),
        })
    }
}

pub struct ZmqLobby {
    socket: ReqSocket,
}

impl Lobby for ZmqLobby {
    async fn request(&mut self, payload: Bytes) -> Result<Bytes, TransportError> {
        self.socket.send(ZmqMessage::from(payload)).await?;
        let reply = self.socket.recv().await?;
        reply.get(0).cloned().ok_or(TransportError::EmptyMessage)
    }
}

pub struct ZmqStateFeed {
    /// `None` once closed
    socket: Option<SubSocket>,
    filter: Bytes,
}

impl StateFeed for ZmqStateFeed {
    async fn recv(&mut self) -> Result<StateMessage, TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        loop {
            let msg = socket.recv().await?;
            let (Some(tag), Some(payload)) = (msg.get(0), msg.get(1)) else {
                debug!(parts = msg.len(), "Dropping state message without payload");
                continue;
            };
            if tag.starts_with(&self.filter) {
                return Ok(StateMessage {
                    tag: tag.clone(),
                    payload: payload.clone(),
                });
            }
            debug!(tag = %String::from_utf8_lossy(tag), "Dropping state message for other game");
        }
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            for err in socket.close().await {
                warn!(error = %err, "Error closing state socket");
            }
        }
    }
}

pub struct ZmqControl {
    /// `None` once closed
    socket: Option<PushSocket>,
}

impl ControlSink for ZmqControl {
    async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        socket.send(ZmqMessage::from(line.to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            for err in socket.close().await {
                warn!(error = %err, "Error closing control socket");
            }
        }
    }
}
