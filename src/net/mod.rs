//! Wire protocol and ZeroMQ transports for the lobby, state and control
//! channels

pub mod protocol;
pub mod transport;

#[cfg(test)]
pub mod memory;

use std::time::Duration;

pub use transport::{Connector, ControlSink, Lobby, StateFeed, StateMessage, ZmqConnector};

/// Transport-level failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Could not resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    #[error("Channel closed")]
    Closed,

    #[error("Received a message with no frames")]
    EmptyMessage,

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("ZeroMQ error: {0}")]
    Zmq(#[from] zeromq::ZmqError),
}
