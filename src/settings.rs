//! Tuning settings
//!
//! Every knob for a run in one serde struct. Missing JSON fields fall back to
//! the defaults, so a settings file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, check_rate};
use crate::sim::{BeamParams, MiasmaParams, WeatherParams, WindParams};

/// Player values the fog simulation needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerParams {
    /// Collision radius used for the fog damage check
    pub radius: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self { radius: 18.0 }
    }
}

/// Complete tuning for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub beam: BeamParams,
    pub wind: WindParams,
    pub miasma: MiasmaParams,
    pub weather: WeatherParams,
    pub player: PlayerParams,
}

impl Settings {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.beam.validate()?;
        self.wind.validate()?;
        self.miasma.validate()?;
        self.weather.validate()?;
        check_rate("player.radius", self.player.radius)?;
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
