//! Message definitions for the lobby and control channels

use serde::{Deserialize, Serialize};

use crate::nav::ControlCommand;

/// Registration request sent to the lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyRequest {
    /// Ship name
    pub name: String,
    /// Team name
    pub team: String,
}

/// Lobby reply assigning the ship to a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyReply {
    /// Credential required on every control message
    pub secret: String,
    /// Game id, also the state subscription filter
    pub game: String,
    /// Map name used to locate flow field files
    pub map: String,
}

/// Encode a control message as `secret,linear,rotational`
pub fn control_line(secret: &str, command: ControlCommand) -> String {
    format!("{},{}", secret, command)
}
