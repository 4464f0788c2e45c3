//! Session lifecycle: registration, the per-tick control loop and the
//! retry supervisor around them

pub mod pilot;
pub mod session;
pub mod supervisor;

use std::time::Duration;

use tokio::sync::watch;

use crate::nav::MapDataError;
use crate::net::TransportError;

pub use pilot::{Pilot, TickStats};
pub use session::{register, RegistrationError, Session};
pub use supervisor::{MapDir, MapSource, Supervisor, SupervisorConfig};

/// Why a session attempt ended
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Map data unusable: {0}")]
    MapData(#[from] MapDataError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("No state broadcast for {0:?}")]
    StateTimeout(Duration),

    #[error("Giving up after {attempts} consecutive failed sessions: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<SessionError>,
    },
}

/// Resolves once cancellation is requested; never resolves if the sender
/// goes away without cancelling
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
