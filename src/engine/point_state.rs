use log::{debug, error, info};

use crate::color::{mix_colors, Color};
use crate::constants::{team_color, NEUTRAL_COLOR};
use crate::types::{ContestEvent, Point, PointPhase, PointStatus, Team};

use super::presence::PresenceSnapshot;

/// Feedback owed to the players present at a point after one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Quiet,
    Capturing(Team),
    Stealing(Team),
    Contested,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointOutcome {
    pub event: Option<ContestEvent>,
    pub feedback: Feedback,
}

impl PointOutcome {
    fn quiet() -> Self {
        Self {
            event: None,
            feedback: Feedback::Quiet,
        }
    }
}

/// Contest state of one capture point.
///
/// The sign of `occupation_score` says which team is advancing (positive for
/// TeamA); reaching `±max_occupation` means that team holds the point.
/// `steal_score` only moves while the point is held and carries the sign of
/// the team trying to flip it back to neutral.
#[derive(Clone, Debug)]
pub struct PointContestState {
    point: Point,
    max_occupation: i32,
    max_steal: i32,
    occupation_score: i32,
    steal_score: i32,
    contested: bool,
}

impl PointContestState {
    pub fn new(point: Point, max_occupation: i32, max_steal: i32) -> Self {
        Self {
            point,
            max_occupation,
            max_steal,
            occupation_score: 0,
            steal_score: 0,
            contested: false,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn occupation_score(&self) -> i32 {
        self.occupation_score
    }

    pub fn steal_score(&self) -> i32 {
        self.steal_score
    }

    pub fn is_contested(&self) -> bool {
        self.contested
    }

    pub fn controlling_team(&self) -> Option<Team> {
        if self.occupation_score.abs() == self.max_occupation {
            Team::from_sign(self.occupation_score)
        } else {
            None
        }
    }

    pub fn phase(&self) -> PointPhase {
        if self.contested {
            PointPhase::Contested
        } else if self.controlling_team().is_some() {
            if self.steal_score != 0 {
                PointPhase::BeingStolen
            } else {
                PointPhase::Held
            }
        } else if self.occupation_score != 0 {
            PointPhase::Advancing
        } else {
            PointPhase::Neutral
        }
    }

    pub fn progress_percentage(&self) -> f32 {
        self.occupation_score.abs() as f32 / self.max_occupation as f32
    }

    pub fn steal_percentage(&self) -> f32 {
        self.steal_score.abs() as f32 / self.max_steal as f32
    }

    pub fn reset(&mut self) {
        self.occupation_score = 0;
        self.steal_score = 0;
        self.contested = false;
    }

    pub fn advance(&mut self, presence: &PresenceSnapshot) -> PointOutcome {
        if presence.is_contested() {
            let started = !self.contested;
            self.reset();
            self.contested = true;
            debug!(
                target: "contest",
                "point {} contested ({} vs {})",
                self.point.label(),
                presence.count(Team::TeamA),
                presence.count(Team::TeamB)
            );
            return PointOutcome {
                event: started.then_some(ContestEvent::Contested { point: self.point }),
                feedback: Feedback::Contested,
            };
        }
        self.contested = false;

        let Some(team) = presence.sole_team() else {
            if self.controlling_team().is_some() {
                self.steal_score = 0;
            } else {
                self.occupation_score = 0;
            }
            return PointOutcome::quiet();
        };

        match self.controlling_team() {
            None => self.advance_occupation(team),
            Some(holder) if holder == team => {
                self.steal_score = 0;
                PointOutcome::quiet()
            }
            Some(holder) => self.advance_steal(team, holder),
        }
    }

    fn advance_occupation(&mut self, team: Team) -> PointOutcome {
        if Team::from_sign(self.occupation_score) == Some(team.opponent()) {
            self.occupation_score = 0;
        }
        self.occupation_score = (self.occupation_score + team.direction())
            .clamp(-self.max_occupation, self.max_occupation);
        self.steal_score = 0;
        debug!(
            target: "contest",
            "{:?} occupying point {}: {}/{}",
            team,
            self.point.label(),
            self.occupation_score.abs(),
            self.max_occupation
        );

        let event = if self.occupation_score.abs() == self.max_occupation {
            info!(target: "contest", "point {} captured by {:?}", self.point.label(), team);
            Some(ContestEvent::CaptureCompleted {
                point: self.point,
                team,
            })
        } else {
            None
        };
        PointOutcome {
            event,
            feedback: Feedback::Capturing(team),
        }
    }

    fn advance_steal(&mut self, team: Team, holder: Team) -> PointOutcome {
        self.steal_score =
            (self.steal_score + team.direction()).clamp(-self.max_steal, self.max_steal);
        debug!(
            target: "contest",
            "{:?} stealing point {} from {:?}: {}/{}",
            team,
            self.point.label(),
            holder,
            self.steal_score.abs(),
            self.max_steal
        );

        if self.steal_score.abs() < self.max_steal {
            return PointOutcome {
                event: None,
                feedback: Feedback::Stealing(team),
            };
        }

        info!(
            target: "contest",
            "point {} stolen from {:?} by {:?}",
            self.point.label(),
            holder,
            team
        );
        self.occupation_score = 0;
        self.steal_score = 0;
        PointOutcome {
            event: Some(ContestEvent::StealCompleted {
                point: self.point,
                from_team: holder,
                by_team: team,
            }),
            feedback: Feedback::Stealing(team),
        }
    }

    pub fn blended_color(&self) -> Color {
        let blended = match self.phase() {
            PointPhase::Neutral | PointPhase::Contested => Ok(NEUTRAL_COLOR),
            PointPhase::Advancing | PointPhase::Held => {
                match Team::from_sign(self.occupation_score) {
                    Some(team) => {
                        mix_colors(NEUTRAL_COLOR, team_color(team), self.progress_percentage())
                    }
                    None => Ok(NEUTRAL_COLOR),
                }
            }
            PointPhase::BeingStolen => match self.controlling_team() {
                Some(holder) => {
                    mix_colors(team_color(holder), NEUTRAL_COLOR, self.steal_percentage())
                }
                None => Ok(NEUTRAL_COLOR),
            },
        };
        blended.unwrap_or_else(|err| {
            error!(target: "contest", "point {}: {err}", self.point.label());
            NEUTRAL_COLOR
        })
    }

    pub fn status(&self, presence: &PresenceSnapshot) -> PointStatus {
        let phase = self.phase();
        let advancing_team = match phase {
            PointPhase::Advancing => Team::from_sign(self.occupation_score),
            PointPhase::BeingStolen => Team::from_sign(self.steal_score),
            _ => None,
        };
        PointStatus {
            point: self.point,
            phase,
            controlling_team: self.controlling_team(),
            advancing_team,
            occupation_score: self.occupation_score,
            steal_score: self.steal_score,
            progress_percentage: self.progress_percentage(),
            steal_percentage: self.steal_percentage(),
            blended_color: self.blended_color(),
            team_a_present: presence.count(Team::TeamA),
            team_b_present: presence.count(Team::TeamB),
        }
    }
}
