use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, Level};
use point_takeover_server::config::ModeConfig;
use point_takeover_server::constants::TICK_MS;
use point_takeover_server::logging;
use point_takeover_server::round::{RoundDriver, RoundOptions};
use point_takeover_server::types::{HintKind, PlayerHint, StartPlayer, TickResult};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 8)]
    players: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    rounds: u32,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    debug: bool,
}

struct ServerState {
    driver: RoundDriver,
    match_id: String,
    seed: u64,
    round: u32,
    rounds_left: u32,
}

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Finished,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let match_id = cli.match_id.clone().unwrap_or_else(|| make_id("match"));

    let config = match ModeConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            logging::emit_event(
                Level::Error,
                "config_invalid",
                &match_id,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    logging::init(Some(match_id.clone()), cli.debug || config.debug);

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let driver = match RoundDriver::new(
        config,
        make_players(cli.players),
        RoundOptions {
            seed,
            ..RoundOptions::default()
        },
    ) {
        Ok(driver) => driver,
        Err(error) => {
            logging::emit_event(
                Level::Error,
                "round_rejected",
                &match_id,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let state = Arc::new(Mutex::new(ServerState {
        driver,
        match_id: match_id.clone(),
        seed,
        round: 1,
        rounds_left: cli.rounds.max(1) - 1,
    }));
    announce_round_started(&*state.lock().await);

    let mut tick_loop = start_tick_loop(state.clone());
    tokio::select! {
        _ = &mut tick_loop => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "server", "interrupt received, stopping round");
            tick_loop.abort();
            let mut guard = state.lock().await;
            guard.driver.stop();
            finish_round(&guard);
        }
    }
}

fn make_players(count: usize) -> Vec<StartPlayer> {
    (0..count.max(2))
        .map(|idx| StartPlayer {
            id: format!("player_{}", idx + 1),
            name: format!("Player-{:02}", idx + 1),
        })
        .collect()
}

fn make_id(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}

fn start_tick_loop(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            if tick_round(&mut guard) == LoopControl::Finished {
                break;
            }
        }
    })
}

fn tick_round(state: &mut ServerState) -> LoopControl {
    let Some(result) = state.driver.step() else {
        return LoopControl::Finished;
    };
    for line in render_tick(&state.driver, &result) {
        println!("{line}");
    }

    if !state.driver.is_ended() {
        return LoopControl::Continue;
    }
    finish_round(state);
    if state.rounds_left == 0 {
        return LoopControl::Finished;
    }

    state.rounds_left -= 1;
    state.round += 1;
    state.driver.restart();
    announce_round_started(state);
    LoopControl::Continue
}

fn render_tick(driver: &RoundDriver, result: &TickResult) -> Vec<Value> {
    let mut lines = vec![json!({
        "type": "state",
        "tick": result.tick,
        "remainingTicks": driver.game_ticks().saturating_sub(driver.elapsed_ticks()),
        "points": result.per_point,
        "colors": result
            .per_point
            .iter()
            .map(|status| status.blended_color.to_hex_rgb())
            .collect::<Vec<_>>(),
        "events": result.events,
    })];
    lines.extend(result.hints.iter().map(|hint| {
        json!({
            "type": "hint",
            "playerId": hint.player_id,
            "name": driver.player_name(&hint.player_id),
            "message": hint_message(hint),
        })
    }));
    lines
}

fn hint_message(hint: &PlayerHint) -> String {
    let label = hint.point.label();
    match hint.kind {
        HintKind::Capturing => format!("Capturing point {label}"),
        HintKind::Stealing => format!("Taking point {label} from the enemy"),
        HintKind::Contested => format!("Point {label} is contested"),
    }
}

fn announce_round_started(state: &ServerState) {
    let capture = state.driver.capture_rooms();
    logging::emit_event(
        Level::Info,
        "round_started",
        &state.match_id,
        None,
        json!({
            "round": state.round,
            "seed": state.seed,
            "players": state.driver.player_snapshots().len(),
            "gameTicks": state.driver.game_ticks(),
            "pointA": capture.point_a.id,
            "pointB": capture.point_b.id,
        }),
    );
}

fn finish_round(state: &ServerState) {
    let summary = state.driver.build_summary();
    println!(
        "{}",
        json!({
            "type": "round_over",
            "round": state.round,
            "summary": summary,
        })
    );
    logging::emit_event(
        Level::Info,
        "round_finished",
        &state.match_id,
        Some(summary.duration_ticks),
        json!({
            "round": state.round,
            "reason": summary.reason,
            "contests": summary.contests,
            "pointAHolder": summary.point_a.controlling_team,
            "pointBHolder": summary.point_b.controlling_team,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use point_takeover_server::types::Point;

    fn make_state(rounds_left: u32, game_time: i32) -> ServerState {
        let config = ModeConfig {
            game_time,
            ..ModeConfig::default()
        };
        ServerState {
            driver: RoundDriver::new(config, make_players(4), RoundOptions::default())
                .expect("round can start"),
            match_id: "test".to_string(),
            seed: 0,
            round: 1,
            rounds_left,
        }
    }

    #[test]
    fn hint_messages_name_the_point() {
        let hint = PlayerHint {
            player_id: "player_1".to_string(),
            point: Point::PointB,
            kind: HintKind::Contested,
        };
        assert_eq!(hint_message(&hint), "Point B is contested");
        let hint = PlayerHint {
            kind: HintKind::Capturing,
            ..hint
        };
        assert_eq!(hint_message(&hint), "Capturing point B");
    }

    #[test]
    fn roster_has_at_least_two_players() {
        assert_eq!(make_players(0).len(), 2);
        assert_eq!(make_players(5)[4].id, "player_5");
    }

    #[test]
    fn make_id_uses_prefix() {
        let id = make_id("match");
        assert!(id.starts_with("match_"));
        assert_eq!(id.len(), "match_".len() + 10);
    }

    #[test]
    fn state_line_carries_both_points() {
        let mut state = make_state(0, 10);
        let result = state.driver.step().expect("round is running");
        let lines = render_tick(&state.driver, &result);
        assert_eq!(lines[0]["type"], "state");
        assert_eq!(lines[0]["tick"], 1);
        assert_eq!(lines[0]["remainingTicks"], 9);
        assert_eq!(lines[0]["points"].as_array().map(Vec::len), Some(2));
        assert_eq!(lines[0]["colors"], json!(["FFFFFF", "FFFFFF"]));
    }

    #[test]
    fn loop_restarts_until_rounds_are_used_up() {
        let mut state = make_state(1, 3);
        let controls: Vec<LoopControl> = (0..6).map(|_| tick_round(&mut state)).collect();
        assert_eq!(
            controls,
            vec![
                LoopControl::Continue,
                LoopControl::Continue,
                LoopControl::Continue,
                LoopControl::Continue,
                LoopControl::Continue,
                LoopControl::Finished,
            ]
        );
        assert_eq!(state.round, 2);
        assert_eq!(state.rounds_left, 0);
        assert!(state.driver.is_ended());
        assert_eq!(tick_round(&mut state), LoopControl::Finished);
    }
}
