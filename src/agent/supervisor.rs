//! Outer session loop
//!
//! Each attempt walks Registering → AwaitingMap → Subscribed → Running.
//! Any failure along the way tears the attempt down and starts over with a
//! fresh registration after an exponential backoff.

#![allow(async_fn_in_trait)]

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::nav::{FlowField, MapDataError};
use crate::net::{Connector, ControlSink, StateFeed};
use crate::util::backoff::Backoff;

use super::{cancelled, register, Pilot, SessionError, TickStats};

/// Source of flow fields by map name
pub trait MapSource {
    async fn load(&self, map: &str) -> Result<FlowField, MapDataError>;
}

/// Maps stored as files in one directory
#[derive(Debug, Clone)]
pub struct MapDir {
    dir: PathBuf,
}

impl MapDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MapSource for MapDir {
    async fn load(&self, map: &str) -> Result<FlowField, MapDataError> {
        FlowField::load(&self.dir, map).await
    }
}

/// Registration identity and retry policy
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub ship_name: String,
    pub team_name: String,
    pub retry_initial: Duration,
    pub retry_max: Duration,
    /// Consecutive failed attempts before giving up; `Some(1)` stops after
    /// the first failure (None = retry forever)
    pub max_attempts: Option<u32>,
    /// How long to wait for the lobby to assign a game
    pub registration_timeout: Duration,
}

/// Keeps one ship registered and flying
pub struct Supervisor<C, M> {
    connector: C,
    maps: M,
    pilot: Pilot,
    config: SupervisorConfig,
    backoff: Backoff,
}

impl<C, M> Supervisor<C, M>
where
    C: Connector,
    M: MapSource,
{
    pub fn new(connector: C, maps: M, pilot: Pilot, config: SupervisorConfig) -> Self {
        let backoff = Backoff::new(config.retry_initial, config.retry_max);
        Self {
            connector,
            maps,
            pilot,
            config,
            backoff,
        }
    }

    /// Run sessions until cancelled.
    ///
    /// Returns an error only once `max_attempts` consecutive sessions failed.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>) -> Result<(), SessionError> {
        loop {
            if *cancel.borrow() {
                break;
            }

            let err = match self.run_session(&mut cancel).await {
                Ok(()) => break,
                Err(err) => err,
            };

            let delay = self.backoff.next_delay();
            let attempts = self.backoff.failures();
            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                error!(error = %err, attempts, "Session retries exhausted");
                return Err(SessionError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            warn!(
                error = %err,
                attempt = attempts,
                retry_in_ms = delay.as_millis() as u64,
                "Session ended, re-registering"
            );

            tokio::select! {
                _ = cancelled(&mut cancel) => break,
                _ = sleep(delay) => {}
            }
        }

        info!(ship = %self.config.ship_name, "Agent stopped");
        Ok(())
    }

    /// One registration-to-failure cycle; `Ok` only when cancelled
    async fn run_session(&mut self, cancel: &mut watch::Receiver<bool>) -> Result<(), SessionError> {
        let Some(lobby) = until_cancelled(cancel, self.connector.lobby()).await else {
            return Ok(());
        };
        let mut lobby = lobby?;
        let registration = register(
            &mut lobby,
            &self.config.ship_name,
            &self.config.team_name,
            self.config.registration_timeout,
        );
        let Some(session) = until_cancelled(cancel, registration).await else {
            return Ok(());
        };
        let session = session?;
        drop(lobby);

        let Some(field) = until_cancelled(cancel, self.maps.load(&session.map)).await else {
            return Ok(());
        };
        let field = field?;

        let Some(feed) = until_cancelled(cancel, self.connector.subscribe(&session.game)).await else {
            return Ok(());
        };
        let mut feed = feed?;
        let mut control = match until_cancelled(cancel, self.connector.control()).await {
            Some(Ok(control)) => control,
            Some(Err(e)) => {
                feed.close().await;
                return Err(e.into());
            }
            None => {
                feed.close().await;
                return Ok(());
            }
        };
        self.backoff.reset();
        info!(
            game = %session.game,
            map = %session.map,
            ship = %self.pilot.ship_id(),
            "Flying"
        );

        let mut stats = TickStats::default();
        let result = self
            .pilot
            .fly(&session, &field, &mut feed, &mut control, cancel, &mut stats)
            .await;

        feed.close().await;
        control.close().await;
        info!(
            game = %session.game,
            received = stats.received,
            sent = stats.sent,
            send_failures = stats.send_failures,
            ship_missing = stats.ship_missing,
            out_of_bounds = stats.out_of_bounds,
            undecodable = stats.undecodable,
            "Session closed"
        );
        result
    }
}

/// Drive `fut` unless cancellation is requested first
async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        out = fut => Some(out),
    }
}
