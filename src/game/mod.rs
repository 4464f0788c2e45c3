//! World state as broadcast by the game server

pub mod snapshot;

pub use snapshot::{find_entity, EntityState, WorldSnapshot};
