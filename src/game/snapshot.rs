//! World snapshot decoding and entity lookup

use serde::{Deserialize, Serialize};

/// All entities at one simulation tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Entity records in broadcast order
    pub data: Vec<EntityState>,
}

/// Kinematic state of one ship.
///
/// The server sends more fields (velocity, control state, ...) which are
/// ignored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: String,
    /// Position X in world units
    pub x: f64,
    /// Position Y in world units, growing upward
    pub y: f64,
    /// Heading in radians (not normalised by the server)
    pub theta: f64,
    /// Angular velocity in radians per time unit
    pub omega: f64,
}

impl WorldSnapshot {
    /// Decode the JSON payload of a state broadcast
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// First entity whose id matches exactly; `None` if the ship is not in this
/// snapshot (e.g. not spawned yet)
pub fn find_entity<'a>(snapshot: &'a WorldSnapshot, id: &str) -> Option<&'a EntityState> {
    snapshot.data.iter().find(|entity| entity.id == id)
}
