//! Per-tick perceive → decide → act loop

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::game::{find_entity, WorldSnapshot};
use crate::nav::{ControlCommand, FlowField, OutOfBounds, SteeringPolicy};
use crate::net::protocol::control_line;
use crate::net::{ControlSink, StateFeed};

use super::{cancelled, Session, SessionError};

/// Reasons a received snapshot produced no command
#[derive(Debug, thiserror::Error)]
pub enum TickSkip {
    #[error("Undecodable state payload: {0}")]
    Undecodable(#[from] serde_json::Error),

    #[error("Ship not present in snapshot")]
    ShipMissing,

    #[error("{0}")]
    OutOfBounds(#[from] OutOfBounds),
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub received: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub ship_missing: u64,
    pub out_of_bounds: u64,
    pub undecodable: u64,
}

impl TickStats {
    fn record_skip(&mut self, skip: &TickSkip) {
        match skip {
            TickSkip::Undecodable(_) => self.undecodable += 1,
            TickSkip::ShipMissing => self.ship_missing += 1,
            TickSkip::OutOfBounds(_) => self.out_of_bounds += 1,
        }
    }
}

/// Flies one ship through a flow field
#[derive(Debug, Clone)]
pub struct Pilot {
    ship_id: String,
    policy: SteeringPolicy,
    state_timeout: Duration,
}

impl Pilot {
    pub fn new(ship_id: impl Into<String>, policy: SteeringPolicy, state_timeout: Duration) -> Self {
        Self {
            ship_id: ship_id.into(),
            policy,
            state_timeout,
        }
    }

    pub fn ship_id(&self) -> &str {
        &self.ship_id
    }

    /// Turn one state payload into a command
    pub fn decide(&self, payload: &[u8], field: &FlowField) -> Result<ControlCommand, TickSkip> {
        let snapshot = WorldSnapshot::from_slice(payload)?;
        let ship = find_entity(&snapshot, &self.ship_id).ok_or(TickSkip::ShipMissing)?;
        let flow = field.sample(ship.x, ship.y)?;
        Ok(self.policy.decide(ship.theta, ship.omega, flow))
    }

    /// Run ticks until cancelled (`Ok`) or the feed fails or stalls (`Err`).
    ///
    /// Per-tick problems never end the loop. Channels are left open for the
    /// caller to release.
    pub async fn fly<F, C>(
        &self,
        session: &Session,
        field: &FlowField,
        feed: &mut F,
        control: &mut C,
        cancel: &mut watch::Receiver<bool>,
        stats: &mut TickStats,
    ) -> Result<(), SessionError>
    where
        F: StateFeed,
        C: ControlSink,
    {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancelled(cancel) => return Ok(()),
                received = timeout(self.state_timeout, feed.recv()) => received,
            };
            let msg = received.map_err(|_| SessionError::StateTimeout(self.state_timeout))??;
            stats.received += 1;

            let command = match self.decide(&msg.payload, field) {
                Ok(command) => command,
                Err(skip) => {
                    stats.record_skip(&skip);
                    match skip {
                        TickSkip::ShipMissing => {
                            debug!(ship = %self.ship_id, "Ship not in snapshot, skipping tick")
                        }
                        skip => warn!(ship = %self.ship_id, reason = %skip, "Skipping tick"),
                    }
                    continue;
                }
            };

            let line = control_line(&session.secret, command);
            debug!(control = %line, "Sending control");
            match control.send(&line).await {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    stats.send_failures += 1;
                    warn!(error = %e, "Control send failed");
                }
            }
        }
    }
}
