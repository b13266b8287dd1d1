use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::{generate_facility, select_capture_rooms, spawn_rooms, CaptureRooms, Facility};
use crate::config::ModeConfig;
use crate::constants::{team_for_join_index, PLAYER_WALK_SPEED, TIMELINE_LIMIT};
use crate::engine::ContestEngine;
use crate::error::ConfigurationError;
use crate::types::{
    ContestEvent, PlayerSnapshot, Point, PointPhase, RoundEndReason, RoundSummary, StartPlayer,
    Team, TeamTally, TickResult, TimelineEvent, Vec3,
};

const CAPTURE_ROOM_BIAS: f64 = 0.6;
const ROOM_JITTER: f32 = 3.0;

#[derive(Clone, Debug)]
pub struct RoundOptions {
    pub seed: u64,
    pub facility_side: i32,
    pub game_ticks_override: Option<u64>,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            facility_side: 4,
            game_ticks_override: None,
        }
    }
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    id: String,
    name: String,
    team: Team,
    position: Vec3,
    target: Vec3,
    hold_ticks: u32,
}

/// Drives one round: owns the roster and facility, moves bot players and
/// feeds the contest engine one tick per `step`.
#[derive(Clone, Debug)]
pub struct RoundDriver {
    config: ModeConfig,
    facility: Facility,
    capture: CaptureRooms,
    spawn_positions: Vec<Vec3>,
    wander_positions: Vec<Vec3>,
    engine: ContestEngine,
    rng: StdRng,
    start_players: Vec<StartPlayer>,
    players: Vec<PlayerInternal>,

    game_ticks: u64,
    elapsed_ticks: u64,
    end_reason: Option<RoundEndReason>,
    team_a: TeamTally,
    team_b: TeamTally,
    contests: u32,
    timeline: Vec<TimelineEvent>,
}

impl RoundDriver {
    pub fn new(
        config: ModeConfig,
        start_players: Vec<StartPlayer>,
        options: RoundOptions,
    ) -> Result<Self, ConfigurationError> {
        if !config.is_enabled {
            return Err(ConfigurationError::Disabled);
        }
        config.validate()?;

        let facility = generate_facility(options.seed, options.facility_side);
        let capture = select_capture_rooms(&facility.rooms, config.zone_type)?;
        let engine = ContestEngine::initialize(
            capture.point_a.site(),
            capture.point_b.site(),
            config.contest_config(),
        )?;
        info!(
            target: "round",
            "point A: {} / point B: {}",
            capture.point_a.id,
            capture.point_b.id
        );

        let wander_positions: Vec<Vec3> = facility
            .rooms_in(config.zone_type)
            .map(|room| room.position)
            .collect();
        let mut spawn_positions: Vec<Vec3> = spawn_rooms(&facility.rooms, config.zone_type, &capture)
            .iter()
            .map(|room| room.position)
            .collect();
        if spawn_positions.is_empty() {
            spawn_positions = wander_positions.clone();
        }
        let game_ticks = options
            .game_ticks_override
            .unwrap_or_else(|| config.game_ticks());

        let mut driver = Self {
            config,
            facility,
            capture,
            spawn_positions,
            wander_positions,
            engine,
            rng: StdRng::seed_from_u64(options.seed),
            start_players,
            players: Vec::new(),
            game_ticks,
            elapsed_ticks: 0,
            end_reason: None,
            team_a: TeamTally::default(),
            team_b: TeamTally::default(),
            contests: 0,
            timeline: Vec::new(),
        };
        driver.spawn_players();
        Ok(driver)
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn facility(&self) -> &Facility {
        &self.facility
    }

    pub fn capture_rooms(&self) -> &CaptureRooms {
        &self.capture
    }

    pub fn engine(&self) -> &ContestEngine {
        &self.engine
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn game_ticks(&self) -> u64 {
        self.game_ticks
    }

    pub fn team_of(&self, player_id: &str) -> Option<Team> {
        self.players
            .iter()
            .find(|player| player.id == player_id)
            .map(|player| player.team)
    }

    pub fn player_name(&self, player_id: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|player| player.id == player_id)
            .map(|player| player.name.as_str())
    }

    pub fn step(&mut self) -> Option<TickResult> {
        if self.is_ended() {
            return None;
        }
        self.elapsed_ticks += 1;
        self.move_players();
        let snapshots = self.player_snapshots();
        let result = self.engine.tick(&snapshots);
        self.record(&result);
        if self.elapsed_ticks >= self.game_ticks {
            self.finish(RoundEndReason::Timeout);
        }
        Some(result)
    }

    pub fn stop(&mut self) {
        if !self.is_ended() {
            self.finish(RoundEndReason::Stopped);
        }
    }

    pub fn restart(&mut self) {
        self.engine.reset_on_round_restart();
        self.elapsed_ticks = 0;
        self.end_reason = None;
        self.team_a = TeamTally::default();
        self.team_b = TeamTally::default();
        self.contests = 0;
        self.timeline.clear();
        self.spawn_players();
        info!(target: "round", "round restarted");
    }

    pub fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players
            .iter()
            .map(|player| PlayerSnapshot {
                id: player.id.clone(),
                position: player.position,
                current_zone: self
                    .facility
                    .room_at(player.position)
                    .map(|room| room.id.clone()),
                team: Some(player.team),
            })
            .collect()
    }

    pub fn build_summary(&self) -> RoundSummary {
        RoundSummary {
            reason: self.end_reason.unwrap_or(RoundEndReason::Stopped),
            duration_ticks: self.elapsed_ticks,
            point_a: self.engine.status(Point::PointA),
            point_b: self.engine.status(Point::PointB),
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            contests: self.contests,
            timeline: self.timeline.clone(),
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn spawn_players(&mut self) {
        let player_count = self.start_players.len();
        let mut players = Vec::with_capacity(player_count);
        for (index, start) in self.start_players.iter().enumerate() {
            let spawn = self.spawn_positions[self.rng.random_range(0..self.spawn_positions.len())];
            let position = Vec3::new(spawn.x, spawn.y + 1.0, spawn.z);
            players.push(PlayerInternal {
                id: start.id.clone(),
                name: start.name.clone(),
                team: team_for_join_index(index, player_count),
                position,
                target: position,
                hold_ticks: 0,
            });
        }
        self.players = players;
        self.push_timeline("Round started".to_string());
    }

    fn move_players(&mut self) {
        for idx in 0..self.players.len() {
            if self.players[idx].hold_ticks > 0 {
                self.players[idx].hold_ticks -= 1;
                continue;
            }
            let position = self.players[idx].position;
            let target = self.players[idx].target;
            let distance = position.distance(target);
            if distance > PLAYER_WALK_SPEED {
                self.players[idx].position = position.lerp(target, PLAYER_WALK_SPEED / distance);
                continue;
            }

            let next = self.pick_destination();
            let hold_ticks = self.rng.random_range(1..=6);
            let player = &mut self.players[idx];
            player.position = target;
            player.target = next;
            player.hold_ticks = hold_ticks;
        }
    }

    fn pick_destination(&mut self) -> Vec3 {
        let base = if self.rng.random_bool(CAPTURE_ROOM_BIAS) {
            if self.rng.random_bool(0.5) {
                self.capture.point_a.position
            } else {
                self.capture.point_b.position
            }
        } else {
            self.wander_positions[self.rng.random_range(0..self.wander_positions.len())]
        };
        Vec3::new(
            base.x + self.rng.random_range(-ROOM_JITTER..ROOM_JITTER),
            base.y,
            base.z + self.rng.random_range(-ROOM_JITTER..ROOM_JITTER),
        )
    }

    fn tally_mut(&mut self, team: Team) -> &mut TeamTally {
        match team {
            Team::TeamA => &mut self.team_a,
            Team::TeamB => &mut self.team_b,
        }
    }

    fn record(&mut self, result: &TickResult) {
        for status in &result.per_point {
            if status.phase != PointPhase::Advancing {
                continue;
            }
            if let Some(team) = status.advancing_team {
                self.tally_mut(team).capturing_ticks += 1;
            }
        }

        for event in &result.events {
            let label = match *event {
                ContestEvent::CaptureCompleted { point, team } => {
                    self.tally_mut(team).captures += 1;
                    format!("Point {} captured by {}", point.label(), team.display_name())
                }
                ContestEvent::StealCompleted {
                    point,
                    from_team,
                    by_team,
                } => {
                    self.tally_mut(by_team).steals += 1;
                    format!(
                        "Point {} taken back from {} by {}",
                        point.label(),
                        from_team.display_name(),
                        by_team.display_name()
                    )
                }
                ContestEvent::Contested { point } => {
                    self.contests += 1;
                    format!("Point {} contested", point.label())
                }
            };
            debug!(target: "round", "tick {}: {}", self.elapsed_ticks, label);
            self.push_timeline(label);
        }
    }

    fn finish(&mut self, reason: RoundEndReason) {
        self.end_reason = Some(reason);
        self.push_timeline(match reason {
            RoundEndReason::Timeout => "Time up".to_string(),
            RoundEndReason::Stopped => "Round stopped".to_string(),
        });
        info!(
            target: "round",
            "round ended after {} ticks ({:?})",
            self.elapsed_ticks,
            reason
        );
    }

    fn push_timeline(&mut self, label: String) {
        self.timeline.push(TimelineEvent {
            at_tick: self.elapsed_ticks,
            label,
        });
        if self.timeline.len() > TIMELINE_LIMIT {
            let overflow = self.timeline.len() - TIMELINE_LIMIT;
            self.timeline.drain(..overflow);
        }
    }
}
