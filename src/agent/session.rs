//! Lobby registration

use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::net::protocol::{LobbyReply, LobbyRequest};
use crate::net::{Lobby, TransportError};

/// Credentials and assignment returned by one registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub secret: String,
    pub game: String,
    pub map: String,
}

impl From<LobbyReply> for Session {
    fn from(reply: LobbyReply) -> Self {
        Self {
            secret: reply.secret,
            game: reply.game,
            map: reply.map,
        }
    }
}

/// Registration errors
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Lobby unreachable: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed lobby reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Register `ship_name` for `team_name` and wait up to `reply_timeout` for
/// a game assignment
pub async fn register<L: Lobby>(
    lobby: &mut L,
    ship_name: &str,
    team_name: &str,
    reply_timeout: Duration,
) -> Result<Session, RegistrationError> {
    let request = LobbyRequest {
        name: ship_name.to_string(),
        team: team_name.to_string(),
    };
    let payload = Bytes::from(serde_json::to_vec(&request)?);

    info!(ship = %ship_name, team = %team_name, "Awaiting confirmation from lobby");
    let reply = timeout(reply_timeout, lobby.request(payload))
        .await
        .map_err(|_| TransportError::Timeout(reply_timeout))??;
    debug!(reply = %String::from_utf8_lossy(&reply), "Lobby reply");

    let session: Session = serde_json::from_slice::<LobbyReply>(&reply)?.into();
    info!(
        ship = %ship_name,
        game = %session.game,
        map = %session.map,
        "Ship registered"
    );
    Ok(session)
}
