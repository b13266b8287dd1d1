use serde::{Deserialize, Serialize};

use crate::color::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    TeamA,
    TeamB,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::TeamA, Team::TeamB];

    pub fn opponent(self) -> Self {
        match self {
            Self::TeamA => Self::TeamB,
            Self::TeamB => Self::TeamA,
        }
    }

    /// Sign this team pushes a point's counters in: positive for TeamA.
    pub fn direction(self) -> i32 {
        match self {
            Self::TeamA => 1,
            Self::TeamB => -1,
        }
    }

    pub fn from_sign(value: i32) -> Option<Self> {
        match value.signum() {
            1 => Some(Self::TeamA),
            -1 => Some(Self::TeamB),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::TeamA => "Class-D",
            Self::TeamB => "Nine-Tailed-Fox",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Point {
    PointA,
    PointB,
}

impl Point {
    pub const ALL: [Point; 2] = [Point::PointA, Point::PointB];

    pub fn index(self) -> usize {
        match self {
            Self::PointA => 0,
            Self::PointB => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PointA => "A",
            Self::PointB => "B",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    LightContainment,
    HeavyContainment,
    Entrance,
}

impl ZoneType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" | "light_containment" => Some(Self::LightContainment),
            "heavy" | "heavy_containment" => Some(Self::HeavyContainment),
            "entrance" => Some(Self::Entrance),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::LightContainment => "lcz",
            Self::HeavyContainment => "hcz",
            Self::Entrance => "ez",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Airlock,
    Armory,
    Cafe,
    Cafeteria,
    Conference,
    Crossing,
    Curve,
    Hid,
    Plants,
    Straight,
    TCross,
    Toilets,
}

/// One player's facts for a single tick, as supplied by the round driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub position: Vec3,
    #[serde(rename = "currentZone")]
    pub current_zone: Option<String>,
    pub team: Option<Team>,
}

/// Fixed location of a capture point: world position plus the room that
/// gates membership.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapturePointSite {
    pub position: Vec3,
    pub zone: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointPhase {
    Neutral,
    Advancing,
    Held,
    BeingStolen,
    Contested,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointStatus {
    pub point: Point,
    pub phase: PointPhase,
    #[serde(rename = "controllingTeam")]
    pub controlling_team: Option<Team>,
    #[serde(rename = "advancingTeam")]
    pub advancing_team: Option<Team>,
    #[serde(rename = "occupationScore")]
    pub occupation_score: i32,
    #[serde(rename = "stealScore")]
    pub steal_score: i32,
    #[serde(rename = "progressPercentage")]
    pub progress_percentage: f32,
    #[serde(rename = "stealPercentage")]
    pub steal_percentage: f32,
    #[serde(rename = "blendedColor")]
    pub blended_color: Color,
    #[serde(rename = "teamAPresent")]
    pub team_a_present: usize,
    #[serde(rename = "teamBPresent")]
    pub team_b_present: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContestEvent {
    CaptureCompleted {
        point: Point,
        team: Team,
    },
    StealCompleted {
        point: Point,
        #[serde(rename = "fromTeam")]
        from_team: Team,
        #[serde(rename = "byTeam")]
        by_team: Team,
    },
    Contested {
        point: Point,
    },
}

impl ContestEvent {
    pub fn point(&self) -> Point {
        match self {
            Self::CaptureCompleted { point, .. }
            | Self::StealCompleted { point, .. }
            | Self::Contested { point } => *point,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Capturing,
    Stealing,
    Contested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerHint {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub point: Point,
    pub kind: HintKind,
}

#[derive(Clone, Debug, Serialize)]
pub struct TickResult {
    pub tick: u64,
    #[serde(rename = "perPoint")]
    pub per_point: [PointStatus; 2],
    pub events: Vec<ContestEvent>,
    pub hints: Vec<PlayerHint>,
}

impl TickResult {
    pub fn status(&self, point: Point) -> &PointStatus {
        &self.per_point[point.index()]
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TimelineEvent {
    #[serde(rename = "atTick")]
    pub at_tick: u64,
    pub label: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TeamTally {
    pub captures: u32,
    pub steals: u32,
    #[serde(rename = "capturingTicks")]
    pub capturing_ticks: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    Timeout,
    Stopped,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub reason: RoundEndReason,
    #[serde(rename = "durationTicks")]
    pub duration_ticks: u64,
    #[serde(rename = "pointA")]
    pub point_a: PointStatus,
    #[serde(rename = "pointB")]
    pub point_b: PointStatus,
    #[serde(rename = "teamA")]
    pub team_a: TeamTally,
    #[serde(rename = "teamB")]
    pub team_b: TeamTally,
    pub contests: u32,
    pub timeline: Vec<TimelineEvent>,
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
}

#[derive(Clone, Debug)]
pub struct StartPlayer {
    pub id: String,
    pub name: String,
}
