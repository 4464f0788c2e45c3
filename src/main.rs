//! Spacerace Pilot - autonomous flow-field ship controller
//!
//! Registers a ship with the spacerace lobby, follows the state broadcast
//! for the assigned game and steers along the map's precomputed flow field,
//! re-registering whenever a session breaks.

mod agent;
mod config;
mod game;
mod nav;
mod net;
mod util;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::{MapDir, Pilot, Supervisor, SupervisorConfig};
use crate::config::Config;
use crate::nav::SteeringPolicy;
use crate::net::ZmqConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        ship = %config.ship_name,
        team = %config.team_name,
        "Starting Spacerace Pilot"
    );

    // Unresolvable server address is fatal
    let connector = ZmqConnector::resolve(
        &config.host,
        config.lobby_port,
        config.state_port,
        config.control_port,
    )
    .await?;

    let policy = SteeringPolicy::new(config.angular_tolerance);
    info!(
        tolerance_rad = policy.tolerance(),
        maps_dir = %config.maps_dir.display(),
        "Steering configured"
    );

    let pilot = Pilot::new(config.ship_id.clone(), policy, config.state_timeout);
    let mut supervisor = Supervisor::new(
        connector,
        MapDir::new(config.maps_dir.clone()),
        pilot,
        SupervisorConfig {
            ship_name: config.ship_name.clone(),
            team_name: config.team_name.clone(),
            retry_initial: config.retry_initial,
            retry_max: config.retry_max,
            max_attempts: config.max_attempts,
            registration_timeout: config.registration_timeout,
        },
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = cancel_tx.send(true);
    });

    supervisor.run(cancel_rx).await?;

    info!("Pilot shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping pilot");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping pilot");
        }
    }
}
