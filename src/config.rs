use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHASE_GHOSTS, DEFAULT_GHOST_COUNT, GHOST_BASE_SPEED, PLAYER_BASE_SPEED,
    POWER_DURATION_SECS, RESPAWN_IMMOBILIZE_SECS,
};
use crate::error::ConfigError;

const MAX_SPEED: f64 = 60.0;
const MAX_GHOSTS: usize = 16;
const MAX_DURATION_SECS: f64 = 120.0;

/// Runtime tunables. Every field falls back to its default when missing
/// from the JSON source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub player_speed: f64,
    pub ghost_speed: f64,
    pub ghost_count: usize,
    /// The first `chase_ghosts` pursuers start in CHASE, the rest in SCATTER.
    pub chase_ghosts: usize,
    pub power_duration_secs: f64,
    pub immobilize_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_BASE_SPEED,
            ghost_speed: GHOST_BASE_SPEED,
            ghost_count: DEFAULT_GHOST_COUNT,
            chase_ghosts: DEFAULT_CHASE_GHOSTS,
            power_duration_secs: POWER_DURATION_SECS,
            immobilize_secs: RESPAWN_IMMOBILIZE_SECS,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.player_speed = clamp_finite(self.player_speed, 0.0, MAX_SPEED, defaults.player_speed);
        self.ghost_speed = clamp_finite(self.ghost_speed, 0.0, MAX_SPEED, defaults.ghost_speed);
        self.ghost_count = self.ghost_count.min(MAX_GHOSTS);
        self.chase_ghosts = self.chase_ghosts.min(self.ghost_count);
        self.power_duration_secs = clamp_finite(
            self.power_duration_secs,
            0.0,
            MAX_DURATION_SECS,
            defaults.power_duration_secs,
        );
        self.immobilize_secs = clamp_finite(
            self.immobilize_secs,
            0.0,
            MAX_DURATION_SECS,
            defaults.immobilize_secs,
        );
        self
    }
}

fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
