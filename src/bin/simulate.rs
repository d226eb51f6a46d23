use arcade_maze_server::constants::TICK_MS;
use arcade_maze_server::engine::{GameEngine, GameEngineOptions};
use arcade_maze_server::server_utils::normalize_max_minutes;
use arcade_maze_server::types::{GhostStage, Position, RuntimeEvent, Snapshot};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless autopilot runs of the maze engine")]
struct Cli {
    #[arg(long, default_value_t = 3)]
    runs: u32,
    #[arg(long)]
    seed: Option<u32>,
    /// Game-time cap per run.
    #[arg(long)]
    max_minutes: Option<u64>,
    #[arg(long, default_value_t = 0)]
    start_level: u32,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    #[serde(rename = "startLevel")]
    start_level: u32,
    #[serde(rename = "reachedLevel")]
    reached_level: u32,
    score: i32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "timedOut")]
    timed_out: bool,
    #[serde(rename = "pickupsEaten")]
    pickups_eaten: i32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: i32,
    #[serde(rename = "fruitsEaten")]
    fruits_eaten: i32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: i32,
    captures: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: i32,
    #[serde(rename = "bestScore")]
    best_score: i32,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    runs: Vec<RunResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(|| now_ms() as u32);
    let max_ms = normalize_max_minutes(cli.max_minutes);
    let started_at_ms = now_ms();
    let mut results = Vec::new();
    let mut anomaly_count = 0usize;

    for run in 0..cli.runs.max(1) {
        let seed = base_seed.wrapping_add(run);
        emit_log(
            "info",
            "run_started",
            Some(seed),
            None,
            json!({ "run": run, "startLevel": cli.start_level }),
        );
        let (result, records) = match run_once(run, seed, cli.start_level, max_ms) {
            Ok(outcome) => outcome,
            Err(error) => {
                emit_log(
                    "error",
                    "engine_init_failed",
                    Some(seed),
                    None,
                    json!({ "error": error }),
                );
                std::process::exit(2);
            }
        };
        for record in &records {
            emit_log(
                "warn",
                "anomaly_detected",
                Some(seed),
                Some(record.tick),
                json!({ "message": record.message }),
            );
        }
        anomaly_count += records.len();
        emit_log(
            "info",
            "run_finished",
            Some(seed),
            None,
            json!({
                "score": result.score,
                "reachedLevel": result.reached_level,
                "durationMs": result.duration_ms,
                "timedOut": result.timed_out,
            }),
        );
        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(result);
    }

    let summary = build_run_summary(started_at_ms, now_ms(), results, anomaly_count);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                None,
                None,
                json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        "info",
        "all_runs_finished",
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "bestScore": summary.best_score,
        }),
    );
    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn run_once(
    run: u32,
    seed: u32,
    start_level: u32,
    max_ms: u64,
) -> Result<(RunResultLine, Vec<AnomalyRecord>), String> {
    let mut engine = GameEngine::new(GameEngineOptions {
        seed,
        start_level,
        ..GameEngineOptions::default()
    })
    .map_err(|error| error.to_string())?;

    let mut anomalies = Vec::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut levels_cleared = 0;
    let mut captures = 0;
    let mut elapsed = 0u64;

    while !engine.is_ended() && elapsed < max_ms {
        let dir = engine.autopilot_direction();
        engine.set_input(dir);
        engine.step(TICK_MS);
        elapsed += TICK_MS;

        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&engine, &snapshot) {
            push_anomaly(&mut anomalies, &mut records, &mut seen, snapshot.tick, message);
        }
        for event in &snapshot.events {
            match event {
                RuntimeEvent::LevelCleared { .. } => levels_cleared += 1,
                RuntimeEvent::PlayerCaptured { .. } => captures += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    Ok((
        RunResultLine {
            run,
            seed,
            start_level,
            reached_level: summary.level,
            score: summary.score,
            duration_ms: summary.elapsed_ms,
            timed_out: !engine.is_ended(),
            pickups_eaten: summary.pickups_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            fruits_eaten: summary.fruits_eaten,
            levels_cleared,
            captures,
            anomalies,
        },
        records,
    ))
}

fn collect_snapshot_anomalies(engine: &GameEngine, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < 0 {
        anomalies.push(format!("negative score: {}", snapshot.score));
    }
    if snapshot.lives < 0 {
        anomalies.push(format!("negative lives: {}", snapshot.lives));
    }
    if snapshot.pickups_remaining < 0 {
        anomalies.push(format!("negative pickups: {}", snapshot.pickups_remaining));
    }
    if snapshot.power.ghosts_eaten > 4 {
        anomalies.push(format!(
            "more than four ghosts eaten in one power phase: {}",
            snapshot.power.ghosts_eaten
        ));
    }

    let grid = engine.grid();
    let player = Position::new(snapshot.player.x, snapshot.player.y).cell();
    if grid.tile_at(player).is_wall() {
        anomalies.push(format!("player inside wall at ({}, {})", player.x, player.y));
    }
    for ghost in &snapshot.ghosts {
        if ghost.stage != GhostStage::Roaming {
            continue;
        }
        let cell = Position::new(ghost.x, ghost.y).cell();
        if grid.tile_at(cell).is_wall() {
            anomalies.push(format!(
                "{:?} roaming inside wall at ({}, {})",
                ghost.id, cell.x, cell.y
            ));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    records: &mut Vec<AnomalyRecord>,
    seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn build_run_summary(
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let (average_score, average_duration_ms) = if run_count == 0 {
        (0, 0)
    } else {
        let total_score: i64 = runs.iter().map(|run| i64::from(run.score)).sum();
        let total_duration: u64 = runs.iter().map(|run| run.duration_ms).sum();
        (
            (total_score / run_count as i64) as i32,
            total_duration / run_count as u64,
        )
    };
    let best_score = runs.iter().map(|run| run.score).max().unwrap_or(0);
    RunSummary {
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count,
        average_score,
        best_score,
        average_duration_ms,
        runs,
    }
}

fn emit_log(level: &str, event: &str, seed: Option<u32>, tick: Option<u64>, details: Value) {
    let line = json!({
        "timestampMs": now_ms(),
        "level": level,
        "event": event,
        "seed": seed,
        "tick": tick,
        "details": details,
    });
    eprintln!("{line}");
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, text)
}
