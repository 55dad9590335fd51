//! Decision engine integration tests

use std::time::{Duration, Instant};

use courier_ai::agent::Courier;
use courier_ai::ai::*;
use courier_ai::core::{Position, Step};
use courier_ai::jobs::{Job, JobBoard, JobLedger};
use courier_ai::weather::FixedWeather;
use courier_ai::world::{TileMap, WorldQuery};
use proptest::prelude::*;

const EVALUATION_GAP: Duration = Duration::from_millis(500);

fn engine(difficulty: Difficulty, seed: u64) -> AiEngine {
    let mut config = AiConfig::default();
    config.dispatch.difficulty = difficulty.to_string();
    AiEngine::with_seed(config, seed)
}

fn harbor_map() -> TileMap {
    TileMap::load(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/data/maps/harbor_district.json"
    ))
    .expect("harbor map should load")
}

/// Run evaluations until every accepted job is delivered or `limit` runs out
fn run_until_delivered(
    engine: &mut AiEngine,
    courier: &mut Courier,
    map: &TileMap,
    weather: &FixedWeather,
    limit: usize,
) -> Option<usize> {
    let clock = Instant::now();
    for i in 0..limit {
        courier.try_pick_up();
        courier.try_deliver();
        if courier.inventory.is_empty() {
            return Some(i);
        }

        let step = {
            let jobs = courier.inventory.jobs().to_vec();
            let ctx = DecisionContext::new(&*courier, map)
                .with_weather(weather)
                .with_jobs(&jobs);
            engine.decide_at(clock + EVALUATION_GAP * i as u32, &ctx)
        };
        if step != Step::Stay {
            courier.apply_step(step, map);
        }
    }
    None
}

#[test]
fn test_hard_tier_delivers_across_city() {
    let map = harbor_map();
    let mut courier = Courier::new(Position::new(0, 0), 10.0);
    courier
        .accept(Job::new("HD-001", Position::new(0, 0), Position::new(11, 8), 180.0))
        .unwrap();
    let mut engine = engine(Difficulty::Hard, 5);

    let evaluations = run_until_delivered(&mut engine, &mut courier, &map, &FixedWeather(0.85), 60)
        .expect("hard tier should deliver");

    // Manhattan distance is 19 and the street grid allows it
    assert_eq!(evaluations, 19);
    assert_eq!(courier.position, Position::new(11, 8));
    assert_eq!(courier.score, 180.0);
    assert_eq!(engine.graph_planner().rebuilds(), 1);
}

#[test]
fn test_hard_tier_picks_up_before_delivering() {
    let map = harbor_map();
    let mut courier = Courier::new(Position::new(0, 8), 10.0);
    courier
        .accept(Job::new("HD-002", Position::new(3, 3), Position::new(6, 6), 90.0))
        .unwrap();
    let mut engine = engine(Difficulty::Hard, 5);

    let evaluations = run_until_delivered(&mut engine, &mut courier, &map, &FixedWeather(1.0), 80)
        .expect("hard tier should pick up and deliver");
    assert!(evaluations >= 14, "took {}", evaluations);
    assert_eq!(courier.position, Position::new(6, 6));
}

#[test]
fn test_medium_tier_walks_to_dropoff_on_open_ground() {
    let map = TileMap::open(20, 5);
    let mut courier = Courier::new(Position::new(2, 2), 10.0);
    let mut job = Job::new("m", Position::new(2, 2), Position::new(14, 2), 60.0);
    job.picked_up = true;
    courier.accept(job).unwrap();
    let mut engine = engine(Difficulty::Medium, 9);

    let evaluations = run_until_delivered(&mut engine, &mut courier, &map, &FixedWeather(1.0), 30)
        .expect("medium tier should deliver");
    assert_eq!(evaluations, 12);
    assert_eq!(engine.expectimax().loop_break_remaining(), 0);
}

#[test]
fn test_ledger_offers_do_not_move_idle_courier() {
    // Offered jobs alone are not work; the courier waits until it accepts one
    let map = TileMap::open(8, 8);
    let courier = Courier::new(Position::new(4, 4), 10.0);
    let mut board = JobBoard::new(vec![Job::new(
        "offer",
        Position::new(0, 0),
        Position::new(7, 7),
        50.0,
    )]);
    board.release_due(0.0);
    let ledger = JobLedger::new(&courier.inventory, &board);
    let ctx = DecisionContext::new(&courier, &map).with_jobs(&ledger);

    let t0 = Instant::now();
    for difficulty in [Difficulty::Medium, Difficulty::Hard] {
        let mut engine = engine(difficulty, 2);
        assert_eq!(engine.decide_at(t0, &ctx), Step::Stay);
    }
}

#[test]
fn test_world_change_mid_route_replans() {
    let mut map = TileMap::open(6, 3);
    let mut courier = Courier::new(Position::new(0, 1), 10.0);
    let mut job = Job::new("r", Position::new(0, 1), Position::new(5, 1), 70.0);
    job.picked_up = true;
    courier.accept(job).unwrap();
    let mut engine = engine(Difficulty::Hard, 4);
    let t0 = Instant::now();

    let step = {
        let jobs = courier.inventory.jobs().to_vec();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        engine.decide_at(t0, &ctx)
    };
    assert_eq!(step, Step::Right);
    courier.apply_step(step, &map);

    map.set_blocked(2, 1);
    let jobs = courier.inventory.jobs().to_vec();
    let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
    let step = engine.decide_at(t0 + EVALUATION_GAP, &ctx);
    assert!(matches!(step, Step::Up | Step::Down));
    assert_eq!(engine.graph_planner().rebuilds(), 2);
    assert_eq!(engine.graph_planner().target(), Some(Position::new(5, 1)));
}

#[test]
fn test_same_seed_same_decisions() {
    let map = harbor_map();
    let courier = Courier::new(Position::new(3, 3), 10.0);
    let jobs = vec![Job::new("x", Position::new(11, 0), Position::new(0, 8), 90.0)];
    let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
    let t0 = Instant::now();

    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let mut a = engine(difficulty, 77);
        let mut b = engine(difficulty, 77);
        for i in 0..10u32 {
            let now = t0 + EVALUATION_GAP * i;
            assert_eq!(a.decide_at(now, &ctx), b.decide_at(now, &ctx));
        }
    }
}

fn arbitrary_map() -> impl Strategy<Value = (TileMap, Position, Position, Position)> {
    (3i32..10, 3i32..10)
        .prop_flat_map(|(w, h)| {
            (
                Just((w, h)),
                prop::collection::vec(prop::bool::weighted(0.3), (w * h) as usize),
                (0..w, 0..h),
                (0..w, 0..h),
                (0..w, 0..h),
            )
        })
        .prop_map(|((w, h), walls, agent, pickup, dropoff)| {
            let mut map = TileMap::open(w, h);
            for (i, wall) in walls.into_iter().enumerate() {
                if wall {
                    map.set_blocked(i as i32 % w, i as i32 / w);
                }
            }
            let agent = Position::new(agent.0, agent.1);
            map.set_tile(agent.x, agent.y, 'C');
            (
                map,
                agent,
                Position::new(pickup.0, pickup.1),
                Position::new(dropoff.0, dropoff.1),
            )
        })
}

proptest! {
    #[test]
    fn prop_searching_tiers_never_walk_into_walls(
        (map, agent, pickup, dropoff) in arbitrary_map(),
        picked in any::<bool>(),
        multiplier in 0.5f32..1.1,
        seed in any::<u64>(),
    ) {
        let courier = Courier::new(agent, 10.0);
        let mut job = Job::new("p", pickup, dropoff, 100.0);
        job.picked_up = picked;
        let jobs = vec![job];
        let weather = FixedWeather(multiplier);
        let ctx = DecisionContext::new(&courier, &map)
            .with_weather(&weather)
            .with_jobs(&jobs);
        let t0 = Instant::now();

        for difficulty in [Difficulty::Medium, Difficulty::Hard] {
            let mut engine = engine(difficulty, seed);
            for i in 0..4u32 {
                let step = engine.decide_at(t0 + EVALUATION_GAP * i, &ctx);
                prop_assert!(Step::ALL.contains(&step));
                prop_assert!(step == Step::Stay || map.is_valid_step(agent, step));
            }
        }
    }

    #[test]
    fn prop_evaluation_is_deterministic(
        x in -5i32..25,
        y in -5i32..25,
        stamina in 0.0f32..100.0,
        carried in 0.0f32..8.0,
        multiplier in 0.5f32..1.1,
    ) {
        let state = AgentSnapshot {
            position: Position::new(x, y),
            stamina,
            exhausted: false,
            carried_weight: carried,
        };
        let jobs = vec![
            Job::new("a", Position::new(3, 4), Position::new(10, 2), 120.0),
            Job::new("b", Position::new(15, 15), Position::new(0, 0), 40.0),
        ];
        let weather = FixedWeather(multiplier);
        let config = EvaluationConfig::default();

        let first = evaluate(&state, Some(&weather), Some(&jobs), &config);
        let second = evaluate(&state, Some(&weather), Some(&jobs), &config);
        prop_assert_eq!(first, second);
        prop_assert!(first.is_finite());
    }

    #[test]
    fn prop_history_never_exceeds_capacity(moves in prop::collection::vec(0i32..4, 0..64)) {
        let mut history = PositionHistory::new(8);
        for (i, m) in moves.iter().enumerate() {
            history.push(Position::new(*m, i as i32 % 3));
            prop_assert!(history.len() <= 8);
        }
    }
}
