use crate::color::Color;
use crate::types::Team;

pub const TICK_RATE: u32 = 1;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const DEFAULT_GAME_TIME_SECS: i32 = 300;
pub const DEFAULT_OCCUPY_TIME: i32 = 20;
pub const DEFAULT_OCCUPY_STEAL_TIME: i32 = 12;
pub const DEFAULT_CALCULATE_DISTANCE: f32 = 15.0;

pub const TIMELINE_LIMIT: usize = 64;

pub const ROOM_SPACING: f32 = 15.0;
pub const PLAYER_WALK_SPEED: f32 = 4.5;

pub const TEAM_A_COLOR: Color = Color::rgba(239.0 / 255.0, 121.0 / 255.0, 4.0 / 255.0, 1.0);
pub const TEAM_B_COLOR: Color = Color::rgba(7.0 / 255.0, 143.0 / 255.0, 243.0 / 255.0, 1.0);
pub const NEUTRAL_COLOR: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

pub fn team_color(team: Team) -> Color {
    match team {
        Team::TeamA => TEAM_A_COLOR,
        Team::TeamB => TEAM_B_COLOR,
    }
}

/// Teams are split by join order: the first half plays TeamA.
pub fn team_for_join_index(index: usize, player_count: usize) -> Team {
    if index < player_count / 2 {
        Team::TeamA
    } else {
        Team::TeamB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_rosters_put_the_extra_player_on_team_b() {
        let teams: Vec<Team> = (0..5).map(|idx| team_for_join_index(idx, 5)).collect();
        assert_eq!(
            teams,
            vec![Team::TeamA, Team::TeamA, Team::TeamB, Team::TeamB, Team::TeamB]
        );
    }

    #[test]
    fn single_player_lands_on_team_b() {
        assert_eq!(team_for_join_index(0, 1), Team::TeamB);
    }
}
