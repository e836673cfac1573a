//! Location configuration consumed by the notification engine.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Stable identifier of a tracked location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Creates a new identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string encoding used as the persistence key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A geofence transition reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceEvent {
    /// The device entered the region.
    Entry,
    /// The device left the region.
    Exit,
}

impl fmt::Display for GeofenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeofenceEvent::Entry => write!(f, "entry"),
            GeofenceEvent::Exit => write!(f, "exit"),
        }
    }
}

/// How aggressively notifications for a location are spaced out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownMode {
    /// 30 minutes between notifications.
    #[default]
    Normal,
    /// 2 hours between notifications.
    Quiet,
    /// 15 minutes between notifications.
    Frequent,
    /// At most one notification per calendar day.
    OnceDaily,
}

impl CooldownMode {
    /// Minimum spacing between two notifications in this mode.
    pub fn cooldown(&self) -> Duration {
        match self {
            CooldownMode::Normal => Duration::from_secs(1800),
            CooldownMode::Quiet => Duration::from_secs(7200),
            CooldownMode::Frequent => Duration::from_secs(900),
            CooldownMode::OnceDaily => Duration::from_secs(86400),
        }
    }
}

/// Per-location settings owned by the host application.
///
/// The engine only reads this; it is never persisted by the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Unique identifier of the location.
    pub id: LocationId,

    /// Human readable name, used in diagnostics only.
    #[serde(default)]
    pub name: String,

    /// Whether the location is monitored at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Notify when entering the region.
    #[serde(default = "default_true")]
    pub notify_on_entry: bool,

    /// Notify when leaving the region.
    #[serde(default)]
    pub notify_on_exit: bool,

    /// Spacing mode between notifications.
    #[serde(default)]
    pub cooldown_mode: CooldownMode,

    /// Message shown on entry. Not interpreted by the engine.
    #[serde(default)]
    pub entry_message: Option<String>,

    /// Message shown on exit. Not interpreted by the engine.
    #[serde(default)]
    pub exit_message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LocationConfig {
    /// Whether this location wants notifications for the given event type.
    pub fn notifies_on(&self, event: GeofenceEvent) -> bool {
        match event {
            GeofenceEvent::Entry => self.notify_on_entry,
            GeofenceEvent::Exit => self.notify_on_exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_durations() {
        assert_eq!(CooldownMode::Normal.cooldown(), Duration::from_secs(1800));
        assert_eq!(CooldownMode::Quiet.cooldown(), Duration::from_secs(7200));
        assert_eq!(CooldownMode::Frequent.cooldown(), Duration::from_secs(900));
        assert_eq!(CooldownMode::OnceDaily.cooldown(), Duration::from_secs(86400));
    }

    #[test]
    fn test_location_config_defaults_from_yaml_like_json() {
        let json = r#"{"id": "home"}"#;
        let config: LocationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.id, LocationId::from("home"));
        assert!(config.enabled);
        assert!(config.notify_on_entry);
        assert!(!config.notify_on_exit);
        assert_eq!(config.cooldown_mode, CooldownMode::Normal);
    }

    #[test]
    fn test_notifies_on() {
        let config: LocationConfig = serde_json::from_str(
            r#"{"id": "office", "notify_on_entry": false, "notify_on_exit": true}"#,
        )
        .unwrap();

        assert!(!config.notifies_on(GeofenceEvent::Entry));
        assert!(config.notifies_on(GeofenceEvent::Exit));
    }

    #[test]
    fn test_cooldown_mode_serde_names() {
        let mode: CooldownMode = serde_json::from_str(r#""once_daily""#).unwrap();
        assert_eq!(mode, CooldownMode::OnceDaily);
        assert_eq!(serde_json::to_string(&CooldownMode::Frequent).unwrap(), r#""frequent""#);
    }
}
