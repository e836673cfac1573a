use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{deserialize_duration_from_seconds, serialize_duration_to_seconds};

/// Minimum time away after an exit before an entry may notify again.
pub const MIN_AWAY_TIME: Duration = Duration::from_secs(600);

/// Silence after which a notification is always allowed.
pub const SAFETY_NET_INTERVAL: Duration = Duration::from_secs(14400);

/// Hard cap of notifications per location per calendar day.
pub const MAX_DAILY_NOTIFICATIONS: u32 = 10;

/// Limits applied by the full throttling policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleLimits {
    /// Minimum time away after an exit before an entry may notify again.
    #[serde(
        rename = "min_away_time_secs",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub min_away_time: Duration,

    /// Silence after which a notification is allowed regardless of cooldown.
    #[serde(
        rename = "safety_net_interval_secs",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub safety_net_interval: Duration,

    /// Maximum notifications per location per calendar day.
    pub max_daily_notifications: u32,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        Self {
            min_away_time: MIN_AWAY_TIME,
            safety_net_interval: SAFETY_NET_INTERVAL,
            max_daily_notifications: MAX_DAILY_NOTIFICATIONS,
        }
    }
}
