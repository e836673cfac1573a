//! Command-line operations against the persisted notification state.

use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use thiserror::Error;

use crate::{
    config::{AppConfig, LoaderError, LocationLoader},
    engine::GeofenceNotificationController,
    models::{GeofenceEvent, LocationConfig, LocationId},
    persistence::{error::PersistenceError, sqlite::SqliteStateRepository},
};

/// Errors surfaced by the command-line operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The application configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    /// The location definitions could not be loaded.
    #[error("Location loading error: {0}")]
    LocationLoading(#[from] LoaderError),
    /// The state database could not be opened or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    /// The requested location is not defined.
    #[error("Unknown location '{0}'")]
    UnknownLocation(String),
    /// Stats could not be rendered.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Geofence event kind as accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EventArg {
    /// The device entered the region.
    Entry,
    /// The device left the region.
    Exit,
}

impl From<EventArg> for GeofenceEvent {
    fn from(value: EventArg) -> Self {
        match value {
            EventArg::Entry => GeofenceEvent::Entry,
            EventArg::Exit => GeofenceEvent::Exit,
        }
    }
}

/// Operations exposed by the `geonotify` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decides whether an event at a location should notify.
    Evaluate {
        /// Location id from locations.yaml.
        #[arg(short, long)]
        location: String,
        /// The geofence event.
        #[arg(short, long, value_enum)]
        event: EventArg,
        /// Also record the notification as sent when allowed.
        #[arg(long)]
        dispatch: bool,
    },
    /// Records that a notification for a location was delivered.
    RecordSent {
        /// Location id.
        #[arg(short, long)]
        location: String,
    },
    /// Prints the counters of a location as JSON.
    Stats {
        /// Location id.
        #[arg(short, long)]
        location: String,
    },
    /// Clears the throttling history of a location.
    Reset {
        /// Location id.
        #[arg(short, long)]
        location: String,
    },
    /// Prints every tracked location.
    Summary,
}

/// Runs `command` using the configuration found in `config_dir`.
pub async fn execute(command: Command, config_dir: Option<&str>) -> Result<(), Error> {
    let config = AppConfig::new(config_dir)?;
    tracing::debug!(database_url = %config.database_url, policy = ?config.policy, "Configuration loaded.");

    let repo = Arc::new(SqliteStateRepository::new(&config.database_url).await?);
    repo.run_migrations().await?;
    let controller = GeofenceNotificationController::from_config(repo.clone(), &config).await;

    let report = controller.load_report();
    if report.dropped > 0 {
        eprintln!("warning: {} stored location state(s) could not be decoded", report.dropped);
    }

    match command {
        Command::Evaluate { location, event, dispatch } => {
            let location = find_location(&config, &location)?;
            let event = GeofenceEvent::from(event);
            if dispatch {
                let sent = controller.evaluate_and_dispatch(&location, event, || async { true }).await;
                println!("{}", if sent { "sent" } else { "suppressed" });
            } else {
                let decision = controller.evaluate_with_decision(&location, event).await;
                println!("{}", decision);
            }
        }
        Command::RecordSent { location } => {
            let id = find_location(&config, &location)?.id;
            controller.record_sent(&id).await;
            println!("recorded");
        }
        Command::Stats { location } => {
            let stats = controller.get_stats(&LocationId::from(location)).await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Reset { location } => {
            controller.reset(&LocationId::from(location)).await;
            println!("reset");
        }
        Command::Summary => {
            print!("{}", controller.debug_summary().await);
        }
    }

    repo.checkpoint().await?;
    repo.close().await;
    Ok(())
}

fn find_location(config: &AppConfig, id: &str) -> Result<LocationConfig, Error> {
    LocationLoader::new(config.locations_config_path.clone())
        .load()?
        .into_iter()
        .find(|location| location.id.as_str() == id)
        .ok_or_else(|| Error::UnknownLocation(id.to_string()))
}
