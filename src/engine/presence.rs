use std::collections::BTreeSet;

use crate::types::{PlayerSnapshot, Point, Team};

use super::proximity::Proximity;

/// Players of each team inside one point's zone this tick. Rebuilt from
/// scratch every tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub team_a: BTreeSet<String>,
    pub team_b: BTreeSet<String>,
}

impl PresenceSnapshot {
    pub fn members(&self, team: Team) -> &BTreeSet<String> {
        match team {
            Team::TeamA => &self.team_a,
            Team::TeamB => &self.team_b,
        }
    }

    fn members_mut(&mut self, team: Team) -> &mut BTreeSet<String> {
        match team {
            Team::TeamA => &mut self.team_a,
            Team::TeamB => &mut self.team_b,
        }
    }

    pub fn is_present(&self, team: Team) -> bool {
        !self.members(team).is_empty()
    }

    pub fn is_contested(&self) -> bool {
        self.is_present(Team::TeamA) && self.is_present(Team::TeamB)
    }

    pub fn is_empty(&self) -> bool {
        !self.is_present(Team::TeamA) && !self.is_present(Team::TeamB)
    }

    /// The only team present, if exactly one is.
    pub fn sole_team(&self) -> Option<Team> {
        match (self.is_present(Team::TeamA), self.is_present(Team::TeamB)) {
            (true, false) => Some(Team::TeamA),
            (false, true) => Some(Team::TeamB),
            _ => None,
        }
    }

    pub fn count(&self, team: Team) -> usize {
        self.members(team).len()
    }
}

/// Proximity is only a pre-filter: a player counts for a point when near it
/// and standing in that point's zone. Zones of the two points differ, so a
/// player near both counts for whichever room they are actually in, or for
/// neither.
pub fn counts_for(player: &PlayerSnapshot, proximity: &Proximity, point: Point, zone: &str) -> bool {
    proximity.is_near(point) && player.current_zone.as_deref() == Some(zone)
}

pub fn aggregate(
    point: Point,
    zone: &str,
    players: &[PlayerSnapshot],
    proximities: &[Proximity],
) -> PresenceSnapshot {
    let mut snapshot = PresenceSnapshot::default();
    for (player, proximity) in players.iter().zip(proximities) {
        let Some(team) = player.team else {
            continue;
        };
        if counts_for(player, proximity, point, zone) {
            snapshot.members_mut(team).insert(player.id.clone());
        }
    }
    snapshot
}
