#![warn(missing_docs)]
//! geonotify decides when a geofence entry or exit should produce a user
//! notification, throttling per location with cooldowns, a daily cap and a
//! safety net against long silences.

pub mod clock;
pub mod cmd;
pub mod config;
pub mod engine;
pub mod models;
pub mod persistence;
pub mod test_helpers;
