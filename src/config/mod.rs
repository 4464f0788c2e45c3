//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::util::names::random_name;

/// Length of generated ship/team names when none are configured
const GENERATED_NAME_LEN: usize = 10;

/// Agent configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server hostname shared by all three channels
    pub host: String,
    /// Lobby (registration request/reply) port
    pub lobby_port: u16,
    /// State broadcast (publish/subscribe) port
    pub state_port: u16,
    /// Control (push) port
    pub control_port: u16,

    /// Ship name sent at registration
    pub ship_name: String,
    /// Team name sent at registration
    pub team_name: String,
    /// Entity id to track in state snapshots
    pub ship_id: String,

    /// Directory holding `<map>_flowx` / `<map>_flowy` grids
    pub maps_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,

    /// Heading window (radians) inside which thrust is applied
    pub angular_tolerance: f64,
    /// Maximum wait for the next state broadcast before reconnecting
    pub state_timeout: Duration,
    /// Maximum wait for the lobby to assign a game
    pub registration_timeout: Duration,

    /// First delay between session attempts
    pub retry_initial: Duration,
    /// Upper bound for the delay between session attempts
    pub retry_max: Duration,
    /// Consecutive failed attempts before giving up (None = never)
    pub max_attempts: Option<u32>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok(), &mut rand::thread_rng())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// `rng` only feeds the generated ship and team names, so tests can pass
    /// a seeded generator and get stable names.
    pub fn from_vars<F, R>(lookup: F, rng: &mut R) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        R: Rng + ?Sized,
    {
        let ship_name = lookup("SHIP_NAME").unwrap_or_else(|| random_name(rng, GENERATED_NAME_LEN));
        let team_name = lookup("TEAM_NAME").unwrap_or_else(|| random_name(rng, GENERATED_NAME_LEN));
        let ship_id = lookup("SHIP_ID").unwrap_or_else(|| ship_name.clone());

        let tolerance_deg: f64 = parse_or(&lookup, "ANGULAR_TOLERANCE_DEG", 30.0)?;
        if !tolerance_deg.is_finite() {
            return Err(ConfigError::Invalid("ANGULAR_TOLERANCE_DEG"));
        }

        let retry_initial = Duration::from_millis(parse_or(&lookup, "RETRY_INITIAL_MS", 250)?);
        let retry_max = Duration::from_millis(parse_or(&lookup, "RETRY_MAX_MS", 10_000)?);
        if retry_max < retry_initial {
            return Err(ConfigError::Invalid("RETRY_MAX_MS"));
        }

        let max_attempts = match parse_or::<u32, _>(&lookup, "MAX_ATTEMPTS", 0)? {
            0 => None,
            n => Some(n),
        };

        let log_json = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => false,
            Some("json") => true,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        Ok(Self {
            host: lookup("SPACERACE_HOST").unwrap_or_else(|| "localhost".to_string()),
            lobby_port: parse_or(&lookup, "LOBBY_PORT", 5558)?,
            state_port: parse_or(&lookup, "STATE_PORT", 5556)?,
            control_port: parse_or(&lookup, "CONTROL_PORT", 5557)?,
            ship_name,
            team_name,
            ship_id,
            maps_dir: lookup("MAPS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("maps")),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json,
            angular_tolerance: tolerance_deg.to_radians(),
            state_timeout: Duration::from_millis(parse_or(&lookup, "STATE_TIMEOUT_MS", 5_000)?),
            registration_timeout: Duration::from_millis(parse_or(
                &lookup,
                "REGISTRATION_TIMEOUT_MS",
                60_000,
            )?),
            retry_initial,
            retry_max,
            max_attempts,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
