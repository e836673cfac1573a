//! Configuration module for geonotify.

mod app_config;
mod helpers;
mod loader;
mod location_loader;
mod throttle;

pub use app_config::AppConfig;
pub use helpers::{deserialize_duration_from_seconds, serialize_duration_to_seconds};
pub use loader::{ConfigLoader, LoaderError};
pub use location_loader::LocationLoader;
pub use throttle::{MAX_DAILY_NOTIFICATIONS, MIN_AWAY_TIME, SAFETY_NET_INTERVAL, ThrottleLimits};
