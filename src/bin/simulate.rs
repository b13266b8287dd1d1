use chrono::Utc;
use clap::Parser;
use log::Level;
use point_takeover_server::config::ModeConfig;
use point_takeover_server::constants::TICK_RATE;
use point_takeover_server::error::ConfigurationError;
use point_takeover_server::logging;
use point_takeover_server::round::{RoundDriver, RoundOptions};
use point_takeover_server::types::{
    ContestEvent, PointPhase, PointStatus, RoundEndReason, StartPlayer, Team, TeamTally,
    TickResult, ZoneType,
};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;

const COLOR_EPSILON: f32 = 1e-4;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    players: Option<i32>,
    #[arg(long)]
    minutes: Option<i32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    zone: Option<String>,
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    players: usize,
    minutes: i32,
    seed: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    players: usize,
    minutes: i32,
    reason: RoundEndReason,
    #[serde(rename = "durationTicks")]
    duration_ticks: u64,
    #[serde(rename = "teamA")]
    team_a: TeamTally,
    #[serde(rename = "teamB")]
    team_b: TeamTally,
    contests: u32,
    #[serde(rename = "pointAHolder")]
    point_a_holder: Option<Team>,
    #[serde(rename = "pointBHolder")]
    point_b_holder: Option<Team>,
    #[serde(rename = "maxProgress")]
    max_progress: f32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

/// Every anomaly occurrence, plus each distinct message once in first-seen
/// order.
#[derive(Clone, Debug, Default)]
struct AnomalyLog {
    messages: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn record(&mut self, tick: u64, message: String) {
        if self.seen.insert(message.clone()) {
            self.messages.push(message.clone());
        }
        self.records.push(AnomalyRecord { tick, message });
    }
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationTicks")]
    average_duration_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let mut config = match ModeConfig::load_or_default(cli.config.as_deref()) {
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
    if let Some(raw) = cli.zone.as_deref() {
        let Some(zone) = ZoneType::parse(raw) else {
            logging::emit_event(
                Level::Error,
                "config_invalid",
                &match_id,
                None,
                json!({ "error": format!("unknown zone: {raw}") }),
            );
            std::process::exit(2);
        };
        config.zone_type = zone;
    }
    logging::init(Some(match_id.clone()), cli.debug || config.debug);

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        logging::emit_event(
            Level::Info,
            "scenario_started",
            &match_id,
            None,
            json!({
                "scenario": scenario.name,
                "seed": scenario.seed,
                "players": scenario.players,
                "minutes": scenario.minutes,
            }),
        );
        let scenario_run = match run_scenario(&scenario, &config) {
            Ok(run) => run,
            Err(error) => {
                logging::emit_event(
                    Level::Error,
                    "scenario_failed",
                    &match_id,
                    None,
                    json!({
                        "scenario": scenario.name,
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            logging::emit_event(
                Level::Warn,
                "anomaly_detected",
                &match_id,
                Some(anomaly.tick),
                json!({
                    "scenario": scenario.name,
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        logging::emit_event(
            Level::Info,
            "scenario_finished",
            &match_id,
            Some(scenario_run.finished_tick),
            json!({
                "scenario": scenario.name,
                "reason": scenario_run.result.reason,
                "durationTicks": scenario_run.result.duration_ticks,
                "contests": scenario_run.result.contests,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            logging::emit_event(
                Level::Error,
                "summary_write_failed",
                &match_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    logging::emit_event(
        Level::Info,
        "run_finished",
        &match_id,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationTicks": summary.average_duration_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    scenario: &Scenario,
    config: &ModeConfig,
) -> Result<ScenarioRunResult, ConfigurationError> {
    let start_players: Vec<StartPlayer> = (0..scenario.players)
        .map(|idx| StartPlayer {
            id: format!("bot_{}", idx + 1),
            name: format!("BOT-{:02}", idx + 1),
        })
        .collect();

    let mut driver = RoundDriver::new(
        config.clone(),
        start_players,
        RoundOptions {
            seed: scenario.seed,
            game_ticks_override: Some(scenario.minutes as u64 * 60 * TICK_RATE as u64),
            ..RoundOptions::default()
        },
    )?;

    let mut max_progress = 0.0f32;
    let mut anomalies = AnomalyLog::default();
    let mut last_tick = 0u64;

    while let Some(result) = driver.step() {
        last_tick = result.tick;
        for message in collect_tick_anomalies(&result) {
            anomalies.record(result.tick, message);
        }
        for status in &result.per_point {
            max_progress = max_progress.max(status.progress_percentage);
        }
    }

    let summary = driver.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            players: scenario.players,
            minutes: scenario.minutes,
            reason: summary.reason,
            duration_ticks: summary.duration_ticks,
            team_a: summary.team_a,
            team_b: summary.team_b,
            contests: summary.contests,
            point_a_holder: summary.point_a.controlling_team,
            point_b_holder: summary.point_b.controlling_team,
            max_progress: (max_progress * 1000.0).round() / 10.0,
            anomalies: anomalies.messages,
        },
        anomaly_records: anomalies.records,
        finished_tick: last_tick,
    })
}

fn collect_tick_anomalies(result: &TickResult) -> Vec<String> {
    let mut anomalies = Vec::new();
    for status in &result.per_point {
        anomalies.extend(collect_status_anomalies(status));
    }

    for event in &result.events {
        let status = result.status(event.point());
        match *event {
            ContestEvent::CaptureCompleted { point, team } => {
                if status.controlling_team != Some(team) {
                    anomalies.push(format!(
                        "capture of {} by {:?} not reflected in status",
                        point.label(),
                        team
                    ));
                }
            }
            ContestEvent::StealCompleted { point, .. } => {
                if status.phase != PointPhase::Neutral {
                    anomalies.push(format!(
                        "point {} not neutral after steal: {:?}",
                        point.label(),
                        status.phase
                    ));
                }
            }
            ContestEvent::Contested { point } => {
                if status.phase != PointPhase::Contested {
                    anomalies.push(format!("contest event on uncontested point {}", point.label()));
                }
            }
        }
    }
    anomalies
}

fn collect_status_anomalies(status: &PointStatus) -> Vec<String> {
    let mut anomalies = Vec::new();
    let label = status.point.label();
    for (name, value) in [
        ("progress", status.progress_percentage),
        ("steal", status.steal_percentage),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            anomalies.push(format!("invalid {name} percentage on {label}: {value}"));
        }
    }

    if status.phase == PointPhase::Contested && status.controlling_team.is_some() {
        anomalies.push(format!("contested point {label} still has a controller"));
    }
    if status.steal_score != 0 && status.controlling_team.is_none() {
        anomalies.push(format!(
            "steal progress {} on uncontrolled point {label}",
            status.steal_score
        ));
    }
    if status.phase == PointPhase::Contested
        && (status.team_a_present == 0 || status.team_b_present == 0)
    {
        anomalies.push(format!("point {label} contested without both teams present"));
    }

    let color = status.blended_color;
    if [color.r, color.g, color.b, color.a]
        .iter()
        .any(|channel| {
            !channel.is_finite() || *channel < -COLOR_EPSILON || *channel > 1.0 + COLOR_EPSILON
        })
    {
        anomalies.push(format!("blended colour out of range on {label}"));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);

    if cli.single || cli.players.is_some() || cli.minutes.is_some() {
        let players = cli.players.unwrap_or(4).clamp(2, 64) as usize;
        return vec![Scenario {
            name: format!("custom-p{players}"),
            players,
            minutes: cli.minutes.unwrap_or(3).clamp(1, 30),
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-check-p4".to_string(),
            players: 4,
            minutes: 2,
            seed,
        },
        Scenario {
            name: "crowded-check-p16".to_string(),
            players: 16,
            minutes: 5,
            seed: seed.wrapping_add(1),
        },
    ]
}

fn default_match_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    for scenario in &scenarios {
        *reason_counts.entry(end_reason_key(scenario.reason)).or_insert(0) += 1;
    }
    let total_duration_ticks: u64 = scenarios.iter().map(|scenario| scenario.duration_ticks).sum();
    let average_duration_ticks = if scenario_count == 0 {
        0
    } else {
        total_duration_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ticks,
        reason_counts,
        scenarios,
    }
}

fn end_reason_key(reason: RoundEndReason) -> String {
    match reason {
        RoundEndReason::Timeout => "timeout",
        RoundEndReason::Stopped => "stopped",
    }
    .to_string()
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use point_takeover_server::constants::NEUTRAL_COLOR;
    use point_takeover_server::types::Point;

    fn make_scenario_result(reason: RoundEndReason, duration_ticks: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            players: 4,
            minutes: 1,
            reason,
            duration_ticks,
            team_a: TeamTally::default(),
            team_b: TeamTally::default(),
            contests: 0,
            point_a_holder: None,
            point_b_holder: None,
            max_progress: 0.0,
            anomalies: Vec::new(),
        }
    }

    fn make_status(point: Point) -> PointStatus {
        PointStatus {
            point,
            phase: PointPhase::Neutral,
            controlling_team: None,
            advancing_team: None,
            occupation_score: 0,
            steal_score: 0,
            progress_percentage: 0.0,
            steal_percentage: 0.0,
            blended_color: NEUTRAL_COLOR,
            team_a_present: 0,
            team_b_present: 0,
        }
    }

    #[test]
    fn match_id_defaults_to_the_first_scenario_seed() {
        let cli = Cli {
            single: false,
            players: None,
            minutes: None,
            seed: Some(9),
            match_id: None,
            summary_out: None,
            config: None,
            zone: None,
            debug: false,
        };
        let scenarios = resolve_scenarios(&cli);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[1].seed, 10);
        assert_eq!(default_match_id(scenarios[0].seed, 5), "sim-9-5");
    }

    #[test]
    fn run_summary_counts_end_reasons_and_averages_ticks() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(RoundEndReason::Timeout, 120),
                make_scenario_result(RoundEndReason::Timeout, 120),
                make_scenario_result(RoundEndReason::Stopped, 30),
            ],
            1,
        );
        assert_eq!(summary.average_duration_ticks, 90);
        assert_eq!(summary.scenario_count, 3);
        assert_eq!(
            summary.reason_counts,
            BTreeMap::from([("stopped".to_string(), 1usize), ("timeout".to_string(), 2usize)])
        );
    }

    #[test]
    fn summary_file_keeps_reason_counts_and_fails_without_parent_dir() {
        let now = Utc::now().timestamp_millis();
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(RoundEndReason::Timeout, 60)],
            0,
        );

        let written = std::env::temp_dir().join(format!("point-takeover-summary-{now}.json"));
        write_summary(&written, &summary).expect("temp dir is writable");
        let raw = std::fs::read_to_string(&written).expect("summary was written");
        let _ = std::fs::remove_file(&written);
        let value: serde_json::Value = serde_json::from_str(&raw).expect("summary is json");
        assert_eq!(value["reasonCounts"]["timeout"], 1);
        assert_eq!(value["averageDurationTicks"], 60);

        let missing = std::env::temp_dir()
            .join(format!("point-takeover-missing-{now}"))
            .join("summary.json");
        assert!(write_summary(&missing, &summary).is_err());
    }

    #[test]
    fn anomaly_log_keeps_every_tick_but_lists_each_message_once() {
        let mut log = AnomalyLog::default();
        log.record(10, "contested point A still has a controller".to_string());
        log.record(11, "contested point A still has a controller".to_string());
        log.record(11, "invalid steal percentage on B: 2".to_string());

        assert_eq!(
            log.messages,
            vec![
                "contested point A still has a controller".to_string(),
                "invalid steal percentage on B: 2".to_string(),
            ]
        );
        let ticks: Vec<u64> = log.records.iter().map(|record| record.tick).collect();
        assert_eq!(ticks, vec![10, 11, 11]);
    }

    #[test]
    fn scenario_ends_on_its_last_game_tick() {
        let scenario = Scenario {
            name: "one-minute".to_string(),
            players: 4,
            minutes: 1,
            seed: 21,
        };
        let run = run_scenario(&scenario, &ModeConfig::default()).expect("scenario starts");
        assert_eq!(run.finished_tick, 60);
        assert_eq!(run.result.duration_ticks, 60);
        assert!(run.anomaly_records.is_empty());
    }

    #[test]
    fn contested_point_with_controller_is_flagged() {
        let mut status = make_status(Point::PointA);
        status.phase = PointPhase::Contested;
        status.controlling_team = Some(Team::TeamA);
        status.team_a_present = 1;
        status.team_b_present = 1;
        let anomalies = collect_status_anomalies(&status);
        assert_eq!(anomalies, vec!["contested point A still has a controller".to_string()]);
    }

    #[test]
    fn capture_event_must_match_status() {
        let result = TickResult {
            tick: 3,
            per_point: [make_status(Point::PointA), make_status(Point::PointB)],
            events: vec![ContestEvent::CaptureCompleted {
                point: Point::PointB,
                team: Team::TeamB,
            }],
            hints: Vec::new(),
        };
        let anomalies = collect_tick_anomalies(&result);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].starts_with("capture of B"));
    }

    #[test]
    fn short_scenario_runs_clean() {
        let scenario = Scenario {
            name: "unit".to_string(),
            players: 6,
            minutes: 2,
            seed: 7,
        };
        let config = ModeConfig {
            occupy_time: 4,
            occupy_steal_time: 3,
            ..ModeConfig::default()
        };
        let run = run_scenario(&scenario, &config).expect("scenario starts");
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
        assert_eq!(run.result.duration_ticks, 120);
        assert_eq!(run.result.reason, RoundEndReason::Timeout);
        assert_eq!(run.finished_tick, 120);
    }

    #[test]
    fn disabled_mode_fails_the_scenario() {
        let scenario = Scenario {
            name: "off".to_string(),
            players: 2,
            minutes: 1,
            seed: 1,
        };
        let config = ModeConfig {
            is_enabled: false,
            ..ModeConfig::default()
        };
        assert_eq!(
            run_scenario(&scenario, &config).err(),
            Some(ConfigurationError::Disabled)
        );
    }
}
