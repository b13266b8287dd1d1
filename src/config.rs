use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALCULATE_DISTANCE, DEFAULT_GAME_TIME_SECS, DEFAULT_OCCUPY_STEAL_TIME,
    DEFAULT_OCCUPY_TIME, TICK_RATE,
};
use crate::engine::ContestConfig;
use crate::error::{ConfigLoadError, ConfigurationError};
use crate::types::ZoneType;

/// Game mode settings as read from a JSON file. Every key is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeConfig {
    pub is_enabled: bool,
    pub debug: bool,
    /// Zone the two capture points are picked from.
    pub zone_type: ZoneType,
    /// Round length in seconds (one tick per second).
    pub game_time: i32,
    /// Ticks of exclusive presence needed to capture a neutral point.
    pub occupy_time: i32,
    /// Ticks of exclusive opposing presence needed to neutralise a held point.
    pub occupy_steal_time: i32,
    /// Radius around a point inside which players are considered at all.
    /// Raise it if players standing in the room are not counted.
    pub calculate_distance: f32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            is_enabled: true,
            debug: false,
            zone_type: ZoneType::LightContainment,
            game_time: DEFAULT_GAME_TIME_SECS,
            occupy_time: DEFAULT_OCCUPY_TIME,
            occupy_steal_time: DEFAULT_OCCUPY_STEAL_TIME,
            calculate_distance: DEFAULT_CALCULATE_DISTANCE,
        }
    }
}

impl ModeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|err| match err {
            ParseOrInvalid::Parse(source) => ConfigLoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseOrInvalid::Invalid(err) => ConfigLoadError::Invalid(err),
        })
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str) -> Result<Self, ParseOrInvalid> {
        let config: ModeConfig = serde_json::from_str(raw).map_err(ParseOrInvalid::Parse)?;
        config.validate().map_err(ParseOrInvalid::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.game_time <= 0 {
            return Err(ConfigurationError::InvalidGameTime(self.game_time));
        }
        self.contest_config().validate()
    }

    pub fn contest_config(&self) -> ContestConfig {
        ContestConfig {
            max_occupation: self.occupy_time,
            max_steal: self.occupy_steal_time,
            proximity_threshold: self.calculate_distance,
        }
    }

    pub fn game_ticks(&self) -> u64 {
        self.game_time.max(0) as u64 * TICK_RATE as u64
    }
}

enum ParseOrInvalid {
    Parse(serde_json::Error),
    Invalid(ConfigurationError),
}
