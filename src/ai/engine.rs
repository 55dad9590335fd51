//! Decision dispatcher
//!
//! Throttles evaluations to the configured cooldown and routes each
//! evaluation to the planner of the current difficulty.

use std::time::{Duration, Instant};

use rand::SeedableRng;

use crate::ai::config::AiConfig;
use crate::ai::expectimax::ExpectimaxPlanner;
use crate::ai::graph_planner::GraphPlanner;
use crate::ai::random::RandomPlanner;
use crate::ai::{AiRng, DecisionContext, Difficulty, MovePlanner};
use crate::core::error::Result;
use crate::core::types::Step;

/// One courier's decision engine
///
/// Owns all per-agent search state; give every courier its own engine.
pub struct AiEngine {
    config: AiConfig,
    /// `None` after an unrecognized label was set
    difficulty: Option<Difficulty>,
    cooldown: Duration,
    last_evaluation: Option<Instant>,
    rng: AiRng,
    random: RandomPlanner,
    expectimax: ExpectimaxPlanner,
    graph: GraphPlanner,
    evaluations: u64,
}

impl AiEngine {
    /// Create an engine, seeded from the config or from entropy
    pub fn new(config: AiConfig) -> Self {
        let rng = match config.dispatch.seed {
            Some(seed) => AiRng::seed_from_u64(seed),
            None => AiRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create with a specific RNG seed for deterministic behavior
    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self::with_rng(config, AiRng::seed_from_u64(seed))
    }

    fn with_rng(config: AiConfig, rng: AiRng) -> Self {
        let difficulty = match config.dispatch.difficulty.parse::<Difficulty>() {
            Ok(difficulty) => Some(difficulty),
            Err(_) => {
                tracing::warn!(
                    "Unknown difficulty '{}' in config, courier will stand still",
                    config.dispatch.difficulty
                );
                None
            }
        };

        Self {
            difficulty,
            cooldown: Duration::from_millis(config.dispatch.cooldown_ms),
            last_evaluation: None,
            rng,
            random: RandomPlanner::new(),
            expectimax: ExpectimaxPlanner::new(
                config.search.clone(),
                config.evaluation.clone(),
            ),
            graph: GraphPlanner::new(config.graph.clone()),
            evaluations: 0,
            config,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Current tier, `None` when an unrecognized label is active
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Switch tiers; takes effect on the next evaluation
    ///
    /// Switching to a different tier drops loop history and cached paths so
    /// a later switch back starts clean. The city graph is kept.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if self.difficulty == Some(difficulty) {
            return;
        }
        tracing::debug!(
            "Difficulty {} -> {}",
            self.difficulty.map_or("unknown", |d| d.label()),
            difficulty
        );
        self.reset_planners();
        self.difficulty = Some(difficulty);
    }

    /// Switch tiers by label
    ///
    /// An unrecognized label is stored as such: every later evaluation
    /// yields [`Step::Stay`] until a valid tier is set.
    pub fn set_difficulty_label(&mut self, label: &str) -> Result<()> {
        match label.parse::<Difficulty>() {
            Ok(difficulty) => {
                self.set_difficulty(difficulty);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Unknown difficulty '{}', courier will stand still", label);
                if self.difficulty.is_some() {
                    self.reset_planners();
                }
                self.difficulty = None;
                Err(err)
            }
        }
    }

    /// Force a graph rebuild on the next hard-tier evaluation
    pub fn mark_graph_stale(&mut self) {
        self.graph.mark_stale();
    }

    /// Has the cooldown elapsed since the last evaluation?
    pub fn should_evaluate(&self, now: Instant) -> bool {
        match self.last_evaluation {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        }
    }

    /// Decide the next step using the wall clock
    pub fn decide(&mut self, ctx: &DecisionContext<'_>) -> Step {
        self.decide_at(Instant::now(), ctx)
    }

    /// Decide the next step at `now`
    ///
    /// Inside the cooldown window this returns [`Step::Stay`] without
    /// touching any planner state.
    pub fn decide_at(&mut self, now: Instant, ctx: &DecisionContext<'_>) -> Step {
        if !self.should_evaluate(now) {
            tracing::trace!("Throttled: cooldown not elapsed");
            return Step::Stay;
        }
        self.last_evaluation = Some(now);
        self.evaluations += 1;

        let Some(difficulty) = self.difficulty else {
            return Step::Stay;
        };

        let planner: &mut dyn MovePlanner = match difficulty {
            Difficulty::Easy => &mut self.random,
            Difficulty::Medium => &mut self.expectimax,
            Difficulty::Hard => &mut self.graph,
        };
        let step = planner.plan(ctx, &mut self.rng);
        tracing::trace!(
            "{} tier ({}) chose {:?} at {}",
            difficulty,
            planner.name(),
            step,
            ctx.agent.position()
        );
        step
    }

    /// Evaluations that passed the cooldown gate
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn expectimax(&self) -> &ExpectimaxPlanner {
        &self.expectimax
    }

    pub fn graph_planner(&self) -> &GraphPlanner {
        &self.graph
    }

    fn reset_planners(&mut self) {
        self.random.reset();
        self.expectimax.reset();
        self.graph.reset();
    }
}

impl std::fmt::Debug for AiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiEngine")
            .field("difficulty", &self.difficulty)
            .field("cooldown", &self.cooldown)
            .field("last_evaluation", &self.last_evaluation)
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Courier;
    use crate::core::error::CourierError;
    use crate::core::types::Position;
    use crate::jobs::Job;
    use crate::world::{TileMap, WorldQuery};

    fn config(difficulty: &str) -> AiConfig {
        let mut config = AiConfig::default();
        config.dispatch.difficulty = difficulty.to_string();
        config
    }

    fn delivery_job() -> Vec<Job> {
        let mut job = Job::new("d", Position::new(0, 0), Position::new(4, 0), 40.0);
        job.picked_up = true;
        vec![job]
    }

    #[test]
    fn test_second_call_within_cooldown_is_null() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(0, 0), 10.0);
        let jobs = delivery_job();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut engine = AiEngine::with_seed(config("medium"), 1);
        let t0 = Instant::now();

        assert_eq!(engine.decide_at(t0, &ctx), Step::Right);
        let history_len = engine.expectimax().history().len();
        let searches = engine.expectimax().searches_run();

        assert_eq!(engine.decide_at(t0 + Duration::from_millis(100), &ctx), Step::Stay);
        assert_eq!(engine.expectimax().history().len(), history_len);
        assert_eq!(engine.expectimax().searches_run(), searches);
        assert_eq!(engine.evaluations(), 1);

        assert_eq!(engine.decide_at(t0 + Duration::from_millis(500), &ctx), Step::Right);
        assert_eq!(engine.evaluations(), 2);
    }

    #[test]
    fn test_throttled_call_leaves_route_cache_alone() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(0, 0), 10.0);
        let jobs = delivery_job();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut engine = AiEngine::with_seed(config("hard"), 1);
        let t0 = Instant::now();

        assert_eq!(engine.decide_at(t0, &ctx), Step::Right);
        let path = engine.graph_planner().cached_path().cloned();
        let target = engine.graph_planner().target();
        let rebuilds = engine.graph_planner().rebuilds();
        assert!(path.is_some());

        assert_eq!(engine.decide_at(t0 + Duration::from_millis(100), &ctx), Step::Stay);
        assert_eq!(engine.graph_planner().cached_path().cloned(), path);
        assert_eq!(engine.graph_planner().target(), target);
        assert_eq!(engine.graph_planner().rebuilds(), rebuilds);
        assert_eq!(engine.evaluations(), 1);
    }

    #[test]
    fn test_clock_going_backwards_is_throttled() {
        let map = TileMap::open(3, 3);
        let courier = Courier::new(Position::new(1, 1), 10.0);
        let ctx = DecisionContext::new(&courier, &map);
        let mut engine = AiEngine::with_seed(config("easy"), 1);
        let t0 = Instant::now() + Duration::from_secs(5);

        engine.decide_at(t0, &ctx);
        assert!(!engine.should_evaluate(t0 - Duration::from_secs(1)));
    }

    #[test]
    fn test_unknown_label_yields_null_step() {
        let map = TileMap::open(3, 3);
        let courier = Courier::new(Position::new(1, 1), 10.0);
        let ctx = DecisionContext::new(&courier, &map);
        let mut engine = AiEngine::with_seed(config("easy"), 3);

        let err = engine.set_difficulty_label("nightmare").unwrap_err();
        assert!(matches!(err, CourierError::UnknownDifficulty(_)));
        assert_eq!(engine.difficulty(), None);

        let t0 = Instant::now();
        for i in 0..10 {
            let now = t0 + Duration::from_secs(i);
            assert_eq!(engine.decide_at(now, &ctx), Step::Stay);
        }

        engine.set_difficulty_label("EASY").unwrap();
        assert_eq!(engine.difficulty(), Some(Difficulty::Easy));
    }

    #[test]
    fn test_unknown_config_label_starts_idle() {
        let engine = AiEngine::with_seed(config("expert"), 0);
        assert_eq!(engine.difficulty(), None);
    }

    #[test]
    fn test_routes_to_each_tier() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(0, 0), 10.0);
        let jobs = delivery_job();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let t0 = Instant::now();

        let mut engine = AiEngine::with_seed(config("easy"), 7);
        let step = engine.decide_at(t0, &ctx);
        assert_ne!(step, Step::Stay);
        assert_eq!(engine.expectimax().searches_run(), 0);
        assert!(engine.graph_planner().graph().is_none());

        engine.set_difficulty(Difficulty::Medium);
        assert_eq!(engine.decide_at(t0 + Duration::from_secs(1), &ctx), Step::Right);
        assert_eq!(engine.expectimax().searches_run(), 1);

        engine.set_difficulty(Difficulty::Hard);
        assert_eq!(engine.decide_at(t0 + Duration::from_secs(2), &ctx), Step::Right);
        assert!(engine.graph_planner().graph().is_some());
        assert_eq!(engine.graph_planner().target(), Some(Position::new(4, 0)));
    }

    #[test]
    fn test_switching_tier_resets_transient_state() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(0, 0), 10.0);
        let jobs = delivery_job();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let t0 = Instant::now();

        let mut engine = AiEngine::with_seed(config("hard"), 7);
        engine.decide_at(t0, &ctx);
        assert!(engine.graph_planner().cached_path().is_some());

        // Same tier again is a no-op
        engine.set_difficulty(Difficulty::Hard);
        assert!(engine.graph_planner().cached_path().is_some());

        engine.set_difficulty(Difficulty::Medium);
        assert!(engine.graph_planner().cached_path().is_none());
        assert!(engine.graph_planner().graph().is_some());
        engine.decide_at(t0 + Duration::from_secs(1), &ctx);
        assert_eq!(engine.expectimax().history().len(), 1);

        engine.set_difficulty(Difficulty::Easy);
        assert!(engine.expectimax().history().is_empty());
    }

    #[test]
    fn test_easy_tier_may_return_blocked_direction() {
        // Random tier ignores walls; the caller rejects the move
        let map = TileMap::from_rows(&["BBB", "BCB", "BBB"]);
        let courier = Courier::new(Position::new(1, 1), 10.0);
        let ctx = DecisionContext::new(&courier, &map);
        let mut engine = AiEngine::with_seed(config("easy"), 11);
        let t0 = Instant::now();

        for i in 0..20 {
            let step = engine.decide_at(t0 + Duration::from_secs(i), &ctx);
            assert!(Step::DIRECTIONS.contains(&step));
            assert!(!map.is_valid_step(courier.position, step));
        }
    }

    #[test]
    fn test_mark_graph_stale_rebuilds() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(0, 0), 10.0);
        let jobs = delivery_job();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let t0 = Instant::now();

        let mut engine = AiEngine::with_seed(config("hard"), 7);
        engine.decide_at(t0, &ctx);
        assert_eq!(engine.graph_planner().rebuilds(), 1);
        engine.mark_graph_stale();
        engine.decide_at(t0 + Duration::from_secs(1), &ctx);
        assert_eq!(engine.graph_planner().rebuilds(), 2);
    }
}
