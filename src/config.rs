//! Engine configuration.
//!
//! Everything has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! frame_rate = 50
//!
//! [motion]
//! scroll_speed = 160.0
//! reference_width = 640.0
//! fixed_lifetime_ms = 4000
//!
//! [layout]
//! lane_height = 28.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::comment::MotionTiming;
use crate::render::layout::LaneLayoutConfig;

/// Default output cadence in frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 50;

/// Error type for loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine settings shared by the scheduler, the parser and the layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target output rate of the scheduler loop.
    pub frame_rate: u32,
    /// Scroll parameters comment lifetimes derive from.
    pub motion: MotionTiming,
    /// Lane layout parameters.
    pub layout: LaneLayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            motion: MotionTiming::default(),
            layout: LaneLayoutConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 || self.frame_rate > 1_000 {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be within 1..=1000, got {}",
                self.frame_rate
            )));
        }
        if !(self.motion.scroll_speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "motion.scroll_speed must be positive, got {}",
                self.motion.scroll_speed
            )));
        }
        if !(self.motion.reference_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "motion.reference_width must be positive, got {}",
                self.motion.reference_width
            )));
        }
        if self.motion.fixed_lifetime_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "motion.fixed_lifetime_ms must be positive, got {}",
                self.motion.fixed_lifetime_ms
            )));
        }
        if !(self.layout.lane_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "layout.lane_height must be positive, got {}",
                self.layout.lane_height
            )));
        }
        Ok(())
    }

    /// Wall-clock budget of one scheduler frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}
