//! Headless Courier Simulation
//!
//! Drives one AI courier through a shift on a city grid and prints a
//! summary, for tuning AI configs without the game client.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use courier_ai::agent::Courier;
use courier_ai::ai::{AiConfig, AiEngine, DecisionContext, Difficulty};
use courier_ai::core::{Position, Result, Step};
use courier_ai::jobs::{job::jobs_from_json, Job, JobBoard, JobLedger};
use courier_ai::weather::{Condition, WeatherModel, WeatherView};
use courier_ai::world::{TileMap, WorldQuery};

/// Simulated seconds per tick
const TICK_SECS: f32 = 0.1;

/// Headless courier simulation
#[derive(Parser, Debug)]
#[command(name = "courier_sim")]
#[command(about = "Run an AI courier through a delivery shift and report the outcome")]
struct Args {
    /// Difficulty tier: easy, medium or hard
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Number of 0.1 s ticks to simulate
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// City map JSON; a generated block grid when absent
    #[arg(long)]
    map: Option<PathBuf>,

    /// City weather JSON; a built-in table when absent
    #[arg(long)]
    weather: Option<PathBuf>,

    /// Job feed JSON (array of jobs); generated when absent
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// AI config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Courier carrying capacity
    #[arg(long, default_value_t = 6.0)]
    max_weight: f32,
}

/// JSON output structure
#[derive(Debug, Default, Serialize)]
struct ShiftSummary {
    difficulty: String,
    ticks: u64,
    seed: u64,
    evaluations: u64,
    delivered: usize,
    picked_up: usize,
    score: f32,
    tiles_moved: u64,
    refused_moves: u64,
    null_steps: u64,
    throttled: u64,
    expired: usize,
    jobs_left_on_board: usize,
    final_weather: String,
    final_stamina: f32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "courier_ai=info"
                    .parse()
                    .unwrap_or_else(|_| tracing::Level::INFO.into()),
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    match run(&args, seed) {
        Ok(summary) => print_summary(&summary, &args.format),
        Err(e) => {
            eprintln!("courier_sim: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, seed: u64) -> Result<ShiftSummary> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut config = match &args.config {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };
    config.dispatch.difficulty = args.difficulty.to_string();

    let map = match &args.map {
        Some(path) => TileMap::load(path)?,
        None => generate_city(32, 24, &mut rng),
    };
    let mut weather = match &args.weather {
        Some(path) => WeatherModel::load(path, seed)?,
        None => default_weather(seed),
    };
    let jobs = match &args.jobs {
        Some(path) => jobs_from_json(&std::fs::read_to_string(path)?)?,
        None => generate_jobs(&map, 24, args.ticks as f32 * TICK_SECS, &mut rng),
    };

    let start = first_open_tile(&map)?;
    let mut courier = Courier::new(start, args.max_weight);
    let mut board = JobBoard::new(jobs);
    let mut engine = AiEngine::with_seed(config, seed);

    tracing::info!(
        "Shift start: {}x{} city, {} jobs, courier at {}, difficulty {}",
        map.width(),
        map.height(),
        board.pending_count(),
        start,
        args.difficulty
    );

    let mut summary = ShiftSummary {
        difficulty: args.difficulty.to_string(),
        ticks: args.ticks,
        seed,
        ..Default::default()
    };

    let clock = Instant::now();
    for tick in 0..args.ticks {
        let elapsed = tick as f32 * TICK_SECS;
        let now = clock + Duration::from_millis(tick * 100);

        weather.update(TICK_SECS);
        if board.release_due(elapsed) > 0 {
            tracing::debug!("{} jobs on the board at {:.1}s", board.visible().len(), elapsed);
        }
        for job in courier.inventory.expire_due(elapsed) {
            tracing::info!("Lost {} to its deadline at {:.1}s", job.id, elapsed);
            summary.expired += 1;
        }
        accept_jobs(&mut courier, &mut board);

        let evaluations = engine.evaluations();
        let step = {
            let ledger = JobLedger::new(&courier.inventory, &board);
            let ctx = DecisionContext::new(&courier, &map)
                .with_weather(&weather)
                .with_jobs(&ledger);
            engine.decide_at(now, &ctx)
        };

        if engine.evaluations() == evaluations {
            // Inside the cooldown; no decision was made this tick
            summary.throttled += 1;
        } else if step == Step::Stay {
            summary.null_steps += 1;
            courier.recover(TICK_SECS);
        } else if courier.apply_step(step, &map) {
            summary.tiles_moved += 1;
        } else {
            summary.refused_moves += 1;
        }

        summary.picked_up += courier.try_pick_up().len();
        for (id, payout) in courier.try_deliver() {
            tracing::info!("Delivered {} for {:.0} at {:.1}s", id, payout, elapsed);
            summary.delivered += 1;
        }
    }

    summary.evaluations = engine.evaluations();
    summary.score = courier.score;
    summary.jobs_left_on_board = board.visible().len() + board.pending_count();
    summary.final_weather = weather.condition().to_string();
    summary.final_stamina = courier.stamina;

    tracing::info!(
        "Shift over: {} delivered, score {:.0}, weather x{:.2}",
        summary.delivered,
        summary.score,
        weather.current_multiplier()
    );
    Ok(summary)
}

/// Take offered jobs while the courier has room and fewer than two active
fn accept_jobs(courier: &mut Courier, board: &mut JobBoard) {
    while courier.inventory.jobs().len() < 2 {
        let free = courier.inventory.max_weight() - courier.inventory.total_weight();
        let Some(id) = board
            .visible()
            .iter()
            .find(|job| job.weight <= free)
            .map(|job| job.id.clone())
        else {
            return;
        };
        let Some(job) = board.take(&id) else {
            return;
        };
        if let Err(e) = courier.accept(job.clone()) {
            tracing::warn!("Could not accept {}: {}", id, e);
            board.restore(job);
            return;
        }
        tracing::debug!("Accepted {}", id);
    }
}

/// Street grid every fourth row and column, buildings and parks between
fn generate_city(width: i32, height: i32, rng: &mut ChaCha8Rng) -> TileMap {
    let mut map = TileMap::open(width, height);
    for y in 0..height {
        for x in 0..width {
            if x % 4 == 0 || y % 4 == 0 {
                continue;
            }
            let code = if rng.gen_bool(0.1) { 'P' } else { 'B' };
            map.set_tile(x, y, code);
        }
    }
    map
}

fn default_weather(seed: u64) -> WeatherModel {
    use Condition::*;
    WeatherModel::new(Clear, seed)
        .with_transitions(Clear, &[(Clear, 0.5), (Clouds, 0.3), (Wind, 0.1), (Heat, 0.1)])
        .with_transitions(Clouds, &[(Clear, 0.4), (Clouds, 0.2), (RainLight, 0.3), (Fog, 0.1)])
        .with_transitions(RainLight, &[(Clouds, 0.4), (Rain, 0.4), (Clear, 0.2)])
        .with_transitions(Rain, &[(RainLight, 0.4), (Storm, 0.3), (Clouds, 0.3)])
        .with_transitions(Storm, &[(Rain, 0.7), (Wind, 0.3)])
        .with_transitions(Fog, &[(Clouds, 0.6), (Clear, 0.4)])
        .with_transitions(Wind, &[(Clear, 0.5), (Clouds, 0.5)])
        .with_transitions(Heat, &[(Clear, 0.7), (Clouds, 0.3)])
        .with_transitions(Cold, &[(Clear, 0.5), (Clouds, 0.5)])
}

fn open_tiles(map: &TileMap) -> Vec<Position> {
    (0..map.height())
        .flat_map(|y| (0..map.width()).map(move |x| Position::new(x, y)))
        .filter(|pos| !map.is_blocked(pos.x, pos.y))
        .collect()
}

fn first_open_tile(map: &TileMap) -> Result<Position> {
    open_tiles(map).into_iter().next().ok_or_else(|| {
        courier_ai::core::CourierError::InvalidMap("map has no open tile".into())
    })
}

/// Jobs between random open tiles, released evenly over the shift
fn generate_jobs(map: &TileMap, count: usize, shift_secs: f32, rng: &mut ChaCha8Rng) -> Vec<Job> {
    let tiles = open_tiles(map);
    if tiles.len() < 2 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let pickup = tiles[rng.gen_range(0..tiles.len())];
            let dropoff = tiles[rng.gen_range(0..tiles.len())];
            let distance = pickup.manhattan(&dropoff) as f32;
            Job::new(
                format!("JOB-{:03}", i + 1),
                pickup,
                dropoff,
                40.0 + distance * 6.0,
            )
            .with_weight(rng.gen_range(1..=3) as f32)
            .with_priority(rng.gen_range(0..3))
            .with_release_time(shift_secs * i as f32 / count as f32)
        })
        .collect()
}

fn print_summary(summary: &ShiftSummary, format: &str) {
    match format {
        "json" => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("courier_sim: could not serialize summary: {}", e),
        },
        _ => {
            println!("Courier Shift");
            println!("=============");
            println!("Difficulty: {}", summary.difficulty);
            println!("Seed: {}", summary.seed);
            println!("Ticks: {} ({} evaluations)", summary.ticks, summary.evaluations);
            println!("Delivered: {} (picked up {})", summary.delivered, summary.picked_up);
            println!("Score: {:.0}", summary.score);
            println!(
                "Moves: {} tiles, {} refused, {} null steps, {} throttled ticks",
                summary.tiles_moved, summary.refused_moves, summary.null_steps, summary.throttled
            );
            println!("Expired: {}", summary.expired);
            println!("Jobs left: {}", summary.jobs_left_on_board);
            println!("Final weather: {}", summary.final_weather);
            println!("Final stamina: {:.1}", summary.final_stamina);
        }
    }
}
