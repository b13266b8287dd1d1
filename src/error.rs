use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Point, ZoneType};

/// Invalid setup detected before play. Fatal to the round: the mode must not
/// start.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("no capture point rooms are defined for zone {zone:?}")]
    UnsupportedZone { zone: ZoneType },

    #[error("zone {zone:?} has {found} eligible capture point rooms, need at least 2")]
    NotEnoughRooms { zone: ZoneType, found: usize },

    #[error("both capture points share zone {zone}")]
    SharedZone { zone: String },

    #[error("capture point {point:?} has a non-finite position")]
    NonFinitePosition { point: Point },

    #[error("occupy time must be positive, got {0}")]
    InvalidOccupyTime(i32),

    #[error("occupy steal time must be positive, got {0}")]
    InvalidStealTime(i32),

    #[error("proximity threshold must be a positive finite distance, got {0}")]
    InvalidProximityThreshold(f32),

    #[error("game time must be positive, got {0}")]
    InvalidGameTime(i32),

    #[error("game mode is disabled")]
    Disabled,
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("blend ratio {ratio} is outside [0, 1]")]
pub struct InvalidBlendRatio {
    pub ratio: f32,
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}
