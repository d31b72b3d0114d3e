use clap::Parser;
use maze_chase_engine::config::EngineConfig;
use maze_chase_engine::constants::{START_LIVES, TICK_RATE, TICK_SECS};
use maze_chase_engine::engine::GameEngine;
use maze_chase_engine::types::{RuntimeEvent, SessionState, Snapshot};
use maze_chase_engine::world::{load_level, Level};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_SECONDS: f64 = 180.0;
const MAX_SECONDS: f64 = 3_600.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    /// Text level file; the built-in classic maze when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// JSON engine config overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds per scenario before it counts as a timeout.
    #[arg(long)]
    seconds: Option<f64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    seconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Win,
    GameOver,
    Timeout,
}

impl Outcome {
    fn key(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::GameOver => "game_over",
            Outcome::Timeout => "timeout",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: Outcome,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: u32,
    #[serde(rename = "livesLeft")]
    lives_left: u32,
    #[serde(rename = "pickupsEaten")]
    pickups_eaten: u32,
    #[serde(rename = "powerModes")]
    power_modes: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Per-tick checks against the previous snapshot of the same run.
#[derive(Debug, Default)]
struct InvariantTracker {
    last_score: Option<u32>,
    last_pickups: Option<usize>,
}

impl InvariantTracker {
    fn check(&mut self, snapshot: &Snapshot) -> Vec<String> {
        let mut anomalies = Vec::new();

        if snapshot.lives > START_LIVES {
            anomalies.push(format!("lives out of range: {}", snapshot.lives));
        }
        if snapshot.state == SessionState::GameOver && snapshot.lives != 0 {
            anomalies.push(format!("game over with {} lives", snapshot.lives));
        }

        let player = &snapshot.player;
        if !offsets_valid(player.off_x, player.off_y) {
            anomalies.push(format!(
                "player offset invalid: ({}, {})",
                player.off_x, player.off_y
            ));
        }
        for ghost in &snapshot.ghosts {
            if !offsets_valid(ghost.off_x, ghost.off_y) {
                anomalies.push(format!(
                    "ghost {} offset invalid: ({}, {})",
                    ghost.id, ghost.off_x, ghost.off_y
                ));
            }
            if ghost.immobilized_secs < 0.0 {
                anomalies.push(format!("ghost {} negative immobilization", ghost.id));
            }
        }
        if snapshot.power.seconds_left < 0.0 {
            anomalies.push("negative power time".to_string());
        }

        if let Some(last) = self.last_score {
            if snapshot.score < last {
                anomalies.push(format!("score decreased: {last} -> {}", snapshot.score));
            }
        }
        let restored = snapshot.events.iter().any(|event| {
            matches!(
                event,
                RuntimeEvent::LifeLost { .. } | RuntimeEvent::SessionStarted
            )
        });
        if let Some(last) = self.last_pickups {
            if snapshot.pickups_remaining > last && !restored {
                anomalies.push(format!(
                    "pickups increased without a life loss: {last} -> {}",
                    snapshot.pickups_remaining
                ));
            }
        }

        self.last_score = Some(snapshot.score);
        self.last_pickups = Some(snapshot.pickups_remaining);
        anomalies
    }
}

fn offsets_valid(off_x: f64, off_y: f64) -> bool {
    off_x.is_finite()
        && off_y.is_finite()
        && off_x.abs() < 1.0
        && off_y.abs() < 1.0
        && (off_x == 0.0 || off_y == 0.0)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at = chrono::Utc::now();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at.timestamp_millis()));

    let config = match cli.config.as_deref() {
        None => EngineConfig::default(),
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    &match_id,
                    None,
                    None,
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        },
    };
    let level = load_level(cli.level.as_deref());

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "seconds": scenario.seconds,
                "width": level.grid.width(),
                "height": level.grid.height(),
                "pickups": level.grid.pickups_remaining(),
            }),
        );
        let scenario_run = run_scenario(&scenario, &level, &config);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *outcome_counts
            .entry(scenario_run.result.outcome.key().to_string())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "durationMs": scenario_run.result.duration_ms,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at.to_rfc3339(),
        chrono::Utc::now().to_rfc3339(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
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

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, level: &Level, config: &EngineConfig) -> ScenarioRunResult {
    let mut engine = GameEngine::new(level.clone(), config.clone(), scenario.seed);
    engine.start();

    let max_ticks = (scenario.seconds * TICK_RATE as f64).ceil() as u64;
    let mut tracker = InvariantTracker::default();
    let mut pickups_eaten = 0;
    let mut power_modes = 0;
    let mut ghosts_eaten = 0;
    let mut lives_lost = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last = engine.build_snapshot(true);
    tracker.check(&last);

    while !engine.is_finished() && last.tick < max_ticks {
        let dir = engine.autopilot_direction();
        engine.request_direction(dir);
        engine.step(TICK_SECS);
        let snapshot = engine.build_snapshot(true);
        for message in tracker.check(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletEaten { .. } => pickups_eaten += 1,
                RuntimeEvent::PowerStarted { .. } => power_modes += 1,
                RuntimeEvent::GhostEaten { .. } => ghosts_eaten += 1,
                RuntimeEvent::LifeLost { .. } => lives_lost += 1,
                _ => {}
            }
        }
        last = snapshot;
    }

    let outcome = match last.state {
        SessionState::Win => Outcome::Win,
        SessionState::GameOver => Outcome::GameOver,
        SessionState::Menu | SessionState::Playing => Outcome::Timeout,
    };

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome,
            duration_ms: last.elapsed_ms,
            score: last.score,
            lives_left: last.lives,
            pickups_eaten,
            power_modes,
            ghosts_eaten,
            lives_lost,
            anomalies,
        },
        anomaly_records,
        finished_tick: last.tick,
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(
        cli.seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64),
    );
    let seconds = normalize_seconds(cli.seconds);

    if cli.single {
        return vec![Scenario {
            name: "custom".to_string(),
            seed,
            seconds,
        }];
    }

    vec![
        Scenario {
            name: "autopilot-a".to_string(),
            seed,
            seconds,
        },
        Scenario {
            name: "autopilot-b".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            seconds,
        },
    ]
}

fn normalize_seconds(value: Option<f64>) -> f64 {
    match value {
        Some(seconds) if seconds.is_finite() => seconds.clamp(1.0, MAX_SECONDS),
        _ => DEFAULT_SECONDS,
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("structured log serialization failed: {error}"),
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
