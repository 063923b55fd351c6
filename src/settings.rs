//! Rig settings
//!
//! Loaded from an optional JSON file; every missing field falls back to the
//! defaults in `consts`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conditions::ConditionLevels;
use crate::consts::*;
use crate::sim::SimParams;

/// Settings load/validation error
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Experiment rig configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Field geometry and physics
    pub sim: SimParams,
    /// Tick period in milliseconds
    pub tick_ms: u64,
    /// Obstacle RNG seed (None = fresh entropy each launch)
    pub seed: Option<u64>,

    // === Protocol ===
    /// Difficulty axes crossed into the condition catalog
    pub levels: ConditionLevels,
    /// Identity recorded when the participant prompt is blank or cancelled
    pub placeholder_participant: String,

    // === Output ===
    /// CSV outcome file
    pub results_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sim: SimParams::default(),
            tick_ms: TICK_MS,
            seed: None,

            levels: ConditionLevels::default(),
            placeholder_participant: PLACEHOLDER_PARTICIPANT.to_string(),

            results_path: PathBuf::from(RESULTS_PATH),
        }
    }
}

impl Settings {
    /// Parse settings from JSON text and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Pretty JSON, suitable as a starting point for a settings file
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the protocol cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if self.levels.is_empty() {
            return invalid("every condition axis needs at least one level");
        }
        if self.levels.jump_power.iter().any(|&j| j.is_nan() || j <= 0.0) {
            return invalid("jump power levels must be positive");
        }
        if self.levels.pipe_distance.iter().any(|&d| d <= 0) {
            return invalid("pipe distance levels must be positive");
        }
        if self.levels.hole_size.iter().any(|&h| h <= 0) {
            return invalid("hole size levels must be positive");
        }

        let sim = &self.sim;
        if sim.field_width <= 0 || sim.field_height <= 0 {
            return invalid("field dimensions must be positive");
        }
        if sim.avatar_radius <= 0 || sim.obstacle_width <= 0 {
            return invalid("avatar radius and obstacle width must be positive");
        }
        if sim.scroll_speed <= 0 {
            return invalid("scroll speed must be positive");
        }
        if sim.max_fall_speed.is_nan() || sim.max_fall_speed <= 0.0 {
            return invalid("max fall speed must be positive");
        }
        if sim.gap_range_slack < 0 {
            return invalid("gap range slack must not be negative");
        }
        if self.furthest_obstacle_edge() > i64::from(i32::MAX) {
            return invalid("pipe distance levels place obstacles beyond the coordinate range");
        }
        if self.tick_ms == 0 {
            return invalid("tick period must be at least 1 ms");
        }
        Ok(())
    }

    /// Right edge of the furthest pre-placed obstacle at the widest spacing
    fn furthest_obstacle_edge(&self) -> i64 {
        let sim = &self.sim;
        let widest = self.levels.pipe_distance.iter().copied().max().unwrap_or(0);
        let count = sim.initial_obstacles.saturating_sub(1) as i64;
        let first_x = i64::from(sim.field_width) + i64::from(sim.first_obstacle_offset);
        let respawn_x = i64::from(sim.field_width) + i64::from(sim.respawn_offset);
        first_x.max(respawn_x) + count * i64::from(widest) + i64::from(sim.obstacle_width)
    }
}
