//! Flow-field navigation: map grids and the steering policy built on them

pub mod flow_field;
pub mod steering;

pub use flow_field::{FlowField, FlowVector, MapDataError, OutOfBounds};
pub use steering::{ControlCommand, SteeringPolicy, Thrust, Turn};
