use std::{collections::HashSet, path::PathBuf};

use super::loader::{ConfigLoader, LoaderError};
use crate::models::LocationConfig;

/// Loads location definitions from a `locations.yaml` file.
pub struct LocationLoader {
    loader: ConfigLoader,
}

impl LocationLoader {
    /// Creates a loader for the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { loader: ConfigLoader::new(path) }
    }

    /// Loads all locations, rejecting duplicate identifiers.
    pub fn load(&self) -> Result<Vec<LocationConfig>, LoaderError> {
        let locations: Vec<LocationConfig> = self.loader.load("locations")?;

        let mut seen = HashSet::new();
        for location in &locations {
            if !seen.insert(location.id.clone()) {
                return Err(LoaderError::Invalid(format!(
                    "duplicate location id '{}'",
                    location.id
                )));
            }
        }

        tracing::debug!(count = locations.len(), "Loaded location definitions.");
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{CooldownMode, LocationId};

    #[test]
    fn test_load_locations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locations.yaml");
        std::fs::write(
            &path,
            r#"
locations:
  - id: "home"
    name: "Home"
    notify_on_exit: true
    cooldown_mode: "quiet"
  - id: "pharmacy"
    enabled: false
"#,
        )
        .unwrap();

        let locations = LocationLoader::new(path).load().unwrap();

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, LocationId::from("home"));
        assert!(locations[0].notify_on_exit);
        assert_eq!(locations[0].cooldown_mode, CooldownMode::Quiet);
        assert!(!locations[1].enabled);
        assert_eq!(locations[1].cooldown_mode, CooldownMode::Normal);
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locations.yaml");
        std::fs::write(&path, "locations:\n  - id: \"home\"\n  - id: \"home\"\n").unwrap();

        let result = LocationLoader::new(path).load();

        assert!(matches!(result, Err(LoaderError::Invalid(msg)) if msg.contains("home")));
    }
}
