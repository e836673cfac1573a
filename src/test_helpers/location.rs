use crate::models::{CooldownMode, LocationConfig, LocationId};

/// A builder for creating `LocationConfig` instances for testing.
///
/// Defaults to an enabled location that notifies on entry only, with the
/// normal cooldown.
pub struct LocationBuilder {
    config: LocationConfig,
}

impl LocationBuilder {
    /// Creates a new `LocationBuilder` with the given id.
    pub fn new(id: &str) -> Self {
        Self {
            config: LocationConfig {
                id: LocationId::from(id),
                name: id.to_string(),
                enabled: true,
                notify_on_entry: true,
                notify_on_exit: false,
                cooldown_mode: CooldownMode::Normal,
                entry_message: None,
                exit_message: None,
            },
        }
    }

    /// Sets whether the location is enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Sets whether entries notify.
    pub fn notify_on_entry(mut self, notify: bool) -> Self {
        self.config.notify_on_entry = notify;
        self
    }

    /// Sets whether exits notify.
    pub fn notify_on_exit(mut self, notify: bool) -> Self {
        self.config.notify_on_exit = notify;
        self
    }

    /// Sets the cooldown mode.
    pub fn cooldown_mode(mut self, mode: CooldownMode) -> Self {
        self.config.cooldown_mode = mode;
        self
    }

    /// Builds the `LocationConfig` instance.
    pub fn build(self) -> LocationConfig {
        self.config
    }
}
