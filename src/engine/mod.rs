use log::{debug, info};
use serde::Serialize;

use crate::constants::{
    DEFAULT_CALCULATE_DISTANCE, DEFAULT_OCCUPY_STEAL_TIME, DEFAULT_OCCUPY_TIME,
};
use crate::error::ConfigurationError;
use crate::types::{
    CapturePointSite, ContestEvent, HintKind, PlayerHint, PlayerSnapshot, Point, PointStatus,
    Team, TickResult,
};

mod point_state;
mod presence;
mod proximity;

pub use self::point_state::{Feedback, PointContestState, PointOutcome};
pub use self::presence::{aggregate, PresenceSnapshot};
pub use self::proximity::{classify, Nearness, Proximity};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ContestConfig {
    #[serde(rename = "maxOccupation")]
    pub max_occupation: i32,
    #[serde(rename = "maxSteal")]
    pub max_steal: i32,
    #[serde(rename = "proximityThreshold")]
    pub proximity_threshold: f32,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            max_occupation: DEFAULT_OCCUPY_TIME,
            max_steal: DEFAULT_OCCUPY_STEAL_TIME,
            proximity_threshold: DEFAULT_CALCULATE_DISTANCE,
        }
    }
}

impl ContestConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_occupation <= 0 {
            return Err(ConfigurationError::InvalidOccupyTime(self.max_occupation));
        }
        if self.max_steal <= 0 {
            return Err(ConfigurationError::InvalidStealTime(self.max_steal));
        }
        if !self.proximity_threshold.is_finite() || self.proximity_threshold <= 0.0 {
            return Err(ConfigurationError::InvalidProximityThreshold(
                self.proximity_threshold,
            ));
        }
        Ok(())
    }
}

/// Runs the per-tick contest over both capture points.
///
/// The engine owns no clock: the caller delivers one `tick` at a time and
/// must not overlap calls.
#[derive(Clone, Debug)]
pub struct ContestEngine {
    config: ContestConfig,
    sites: [CapturePointSite; 2],
    points: [PointContestState; 2],
    tick_counter: u64,
}

impl ContestEngine {
    pub fn initialize(
        point_a: CapturePointSite,
        point_b: CapturePointSite,
        config: ContestConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        for (point, site) in [(Point::PointA, &point_a), (Point::PointB, &point_b)] {
            if !site.position.is_finite() {
                return Err(ConfigurationError::NonFinitePosition { point });
            }
        }
        if point_a.zone == point_b.zone {
            return Err(ConfigurationError::SharedZone { zone: point_a.zone });
        }

        info!(
            target: "contest",
            "capture points ready: A={} B={} (occupy {}, steal {}, distance {})",
            point_a.zone,
            point_b.zone,
            config.max_occupation,
            config.max_steal,
            config.proximity_threshold
        );
        let points = Point::ALL
            .map(|point| PointContestState::new(point, config.max_occupation, config.max_steal));
        Ok(Self {
            config,
            sites: [point_a, point_b],
            points,
            tick_counter: 0,
        })
    }

    pub fn config(&self) -> &ContestConfig {
        &self.config
    }

    pub fn site(&self, point: Point) -> &CapturePointSite {
        &self.sites[point.index()]
    }

    pub fn state(&self, point: Point) -> &PointContestState {
        &self.points[point.index()]
    }

    /// Status of `point` as of the last tick, without presence counts.
    pub fn status(&self, point: Point) -> PointStatus {
        self.points[point.index()].status(&PresenceSnapshot::default())
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn tick(&mut self, players: &[PlayerSnapshot]) -> TickResult {
        self.tick_counter += 1;
        let point_a = self.sites[0].position;
        let point_b = self.sites[1].position;
        let threshold = self.config.proximity_threshold;

        let proximities: Vec<Proximity> = players
            .iter()
            .map(|player| {
                let proximity = classify(player.position, point_a, point_b, threshold);
                if proximity.near_both() {
                    debug!(
                        target: "proximity",
                        "{} near both points, zone {:?} decides",
                        player.id,
                        player.current_zone
                    );
                } else if !proximity.near_neither() {
                    debug!(
                        target: "proximity",
                        "{} A: {:.1}m, B: {:.1}m -> {:?}/{:?}",
                        player.id,
                        player.position.distance(point_a),
                        player.position.distance(point_b),
                        proximity.point_a,
                        proximity.point_b
                    );
                }
                proximity
            })
            .collect();

        let mut events = Vec::new();
        let mut hints = Vec::new();
        let per_point = Point::ALL
            .map(|point| self.advance_point(point, players, &proximities, &mut events, &mut hints));

        TickResult {
            tick: self.tick_counter,
            per_point,
            events,
            hints,
        }
    }

    fn advance_point(
        &mut self,
        point: Point,
        players: &[PlayerSnapshot],
        proximities: &[Proximity],
        events: &mut Vec<ContestEvent>,
        hints: &mut Vec<PlayerHint>,
    ) -> PointStatus {
        let presence = aggregate(point, &self.sites[point.index()].zone, players, proximities);
        let state = &mut self.points[point.index()];
        let outcome = state.advance(&presence);

        match outcome.feedback {
            Feedback::Quiet => {}
            Feedback::Capturing(team) => {
                push_hints(hints, point, presence.members(team), HintKind::Capturing)
            }
            Feedback::Stealing(team) => {
                push_hints(hints, point, presence.members(team), HintKind::Stealing)
            }
            Feedback::Contested => {
                for team in Team::ALL {
                    push_hints(hints, point, presence.members(team), HintKind::Contested);
                }
            }
        }
        if let Some(event) = outcome.event {
            events.push(event);
        }
        state.status(&presence)
    }

    pub fn reset_on_round_restart(&mut self) {
        for state in &mut self.points {
            state.reset();
        }
        self.tick_counter = 0;
        info!(target: "contest", "capture points reset for round restart");
    }
}

fn push_hints<'a>(
    hints: &mut Vec<PlayerHint>,
    point: Point,
    players: impl IntoIterator<Item = &'a String>,
    kind: HintKind,
) {
    hints.extend(players.into_iter().map(|player_id| PlayerHint {
        player_id: player_id.clone(),
        point,
        kind,
    }));
}
