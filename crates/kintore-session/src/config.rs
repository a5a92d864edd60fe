//! Session and service configuration.

use config::{builder::DefaultState, ConfigBuilder, Environment};
use kintore_core::{Error, Result};
use kintore_motion::{DetectorConfig, PayloadConfig};
use serde::{Deserialize, Serialize};

/// Environment prefix, e.g. `KINTORE_PAYLOAD__USER_ID`
pub const ENV_PREFIX: &str = "KINTORE";

/// Complete configuration of a workout session and the hub running it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Automatic exercise detection
    pub detector: DetectorConfig,

    /// Metadata stamped onto evaluation payloads
    pub payload: PayloadConfig,

    /// Per-session worker channels
    pub hub: HubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Frames queued per session before producers are back-pressured
    pub frame_queue: usize,

    /// Notifications buffered per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            frame_queue: 256,
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Load configuration from file, overridden by `KINTORE_*` variables
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment());
        Self::load(builder)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(config::Config::builder().add_source(environment()))
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
