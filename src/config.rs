use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Default capacity of the signal channel (the serialization point).
///
/// Capacity 1 makes the hand-off effectively synchronous: a sender worker
/// suspends until the broadcast worker is ready to accept its signal.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 1;

/// Hub Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Capacity of the internal signal channel, must be at least 1.
    pub signal_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            signal_capacity: DEFAULT_SIGNAL_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Loads the configuration from the environment (`UZEL_` prefix),
    /// falling back to defaults for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Adding default values
            .set_default("signal_capacity", DEFAULT_SIGNAL_CAPACITY as i64)?
            // Add environment variables with the UZEL_ prefix
            .add_source(Environment::with_prefix("UZEL"))
            .build()?;

        let settings: Self = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal_capacity == 0 {
            return Err(ConfigError::Message(
                "signal_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
