//! Medium tier: shallow expectimax with loop recovery
//!
//! Max plies pick the courier's best direction; chance plies average over
//! every valid direction, standing in for environmental noise rather than an
//! opponent. Leaves are scored with [`evaluate`].
//!
//! Shallow search oscillates easily, so every accepted position goes into a
//! short history. When one tile keeps reappearing the planner stops searching
//! for a few evaluations and walks randomly instead.

use crate::ai::config::{EvaluationConfig, SearchConfig};
use crate::ai::evaluation::evaluate;
use crate::ai::history::PositionHistory;
use crate::ai::random::random_valid_step;
use crate::ai::{AgentSnapshot, AiRng, DecisionContext, MovePlanner};
use crate::core::types::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ply {
    Max,
    Chance,
}

impl Ply {
    fn next(self) -> Self {
        match self {
            Ply::Max => Ply::Chance,
            Ply::Chance => Ply::Max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpectimaxPlanner {
    search: SearchConfig,
    weights: EvaluationConfig,
    history: PositionHistory,
    loop_break_remaining: u32,
    searches_run: u64,
}

impl ExpectimaxPlanner {
    pub fn new(search: SearchConfig, weights: EvaluationConfig) -> Self {
        let history = PositionHistory::new(search.history_capacity);
        Self {
            search,
            weights,
            history,
            loop_break_remaining: 0,
            searches_run: 0,
        }
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut PositionHistory {
        &mut self.history
    }

    /// Evaluations left before search resumes
    pub fn loop_break_remaining(&self) -> u32 {
        self.loop_break_remaining
    }

    /// Number of times the tree search actually ran
    pub fn searches_run(&self) -> u64 {
        self.searches_run
    }

    /// Run the search from the agent's current state
    ///
    /// Returns the root score and the chosen direction, None when the root
    /// is a leaf or has no valid move.
    pub fn best_move(&mut self, ctx: &DecisionContext<'_>) -> (f32, Option<Step>) {
        self.searches_run += 1;
        self.search_node(ctx, ctx.snapshot(), self.search.depth, Ply::Max)
    }

    fn search_node(
        &self,
        ctx: &DecisionContext<'_>,
        state: AgentSnapshot,
        depth: u32,
        ply: Ply,
    ) -> (f32, Option<Step>) {
        if depth == 0 {
            return (evaluate(&state, ctx.weather, ctx.jobs, &self.weights), None);
        }

        let moves: Vec<Step> = Step::DIRECTIONS
            .into_iter()
            .take(self.search.branching)
            .filter(|step| ctx.world.is_valid_step(state.position, *step))
            .collect();
        if moves.is_empty() {
            return (0.0, None);
        }

        match ply {
            Ply::Max => {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_step = None;
                for step in moves {
                    let (score, _) = self.search_node(ctx, state.moved(step), depth - 1, ply.next());
                    // Strict comparison keeps the earliest direction on ties
                    if score > best_score {
                        best_score = score;
                        best_step = Some(step);
                    }
                }
                (best_score, best_step)
            }
            Ply::Chance => {
                let total: f32 = moves
                    .iter()
                    .map(|step| self.search_node(ctx, state.moved(*step), depth - 1, ply.next()).0)
                    .sum();
                (total / moves.len() as f32, None)
            }
        }
    }
}

impl MovePlanner for ExpectimaxPlanner {
    fn plan(&mut self, ctx: &DecisionContext<'_>, rng: &mut AiRng) -> Step {
        if ctx.agent.is_exhausted() {
            return Step::Stay;
        }

        let has_work = ctx.jobs.is_some_and(|jobs| jobs.has_active_jobs());
        if !has_work {
            return Step::Stay;
        }

        let position = ctx.agent.position();
        self.history.push(position);

        if self.loop_break_remaining > 0 {
            self.loop_break_remaining -= 1;
            tracing::trace!(
                "Loop break at {}: {} random moves left",
                position,
                self.loop_break_remaining
            );
            return random_valid_step(ctx.world, position, rng);
        }

        if self
            .history
            .has_loop(self.search.loop_window, self.search.loop_threshold)
        {
            self.loop_break_remaining = self.search.loop_break_ticks;
            tracing::debug!(
                "Loop detected around {}, moving randomly for {} evaluations",
                position,
                self.loop_break_remaining
            );
            return random_valid_step(ctx.world, position, rng);
        }

        match self.best_move(ctx) {
            (_, Some(step)) if ctx.world.is_valid_step(position, step) => step,
            _ => random_valid_step(ctx.world, position, rng),
        }
    }

    fn reset(&mut self) {
        self.history.clear();
        self.loop_break_remaining = 0;
    }

    fn name(&self) -> &'static str {
        "expectimax"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Courier;
    use crate::core::types::Position;
    use crate::jobs::Job;
    use crate::world::{TileMap, WorldQuery};
    use rand::SeedableRng;

    fn planner() -> ExpectimaxPlanner {
        ExpectimaxPlanner::new(SearchConfig::default(), EvaluationConfig::default())
    }

    fn picked_job(dropoff: Position) -> Vec<Job> {
        let mut job = Job::new("delivery", Position::new(0, 0), dropoff, 100.0);
        job.picked_up = true;
        vec![job]
    }

    #[test]
    fn test_heads_towards_dropoff() {
        let map = TileMap::open(20, 20);
        let courier = Courier::new(Position::new(10, 10), 10.0);
        let mut rng = AiRng::seed_from_u64(3);

        for (dropoff, expected) in [
            (Position::new(13, 10), Step::Right),
            (Position::new(7, 10), Step::Left),
            (Position::new(10, 7), Step::Up),
            (Position::new(10, 13), Step::Down),
        ] {
            let jobs = picked_job(dropoff);
            let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
            let mut planner = planner();
            assert_eq!(planner.plan(&ctx, &mut rng), expected, "towards {}", dropoff);
            assert_eq!(planner.searches_run(), 1);
        }
    }

    #[test]
    fn test_idle_without_jobs() {
        let map = TileMap::open(5, 5);
        let courier = Courier::new(Position::new(2, 2), 10.0);
        let mut rng = AiRng::seed_from_u64(3);
        let mut planner = planner();

        let ctx = DecisionContext::new(&courier, &map);
        assert_eq!(planner.plan(&ctx, &mut rng), Step::Stay);

        let none: Vec<Job> = Vec::new();
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&none);
        assert_eq!(planner.plan(&ctx, &mut rng), Step::Stay);
        assert!(planner.history().is_empty());
    }

    #[test]
    fn test_exhausted_stays() {
        let map = TileMap::open(5, 5);
        let mut courier = Courier::new(Position::new(2, 2), 10.0);
        courier.exhausted = true;
        let jobs = picked_job(Position::new(4, 4));
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut rng = AiRng::seed_from_u64(3);
        let mut planner = planner();
        assert_eq!(planner.plan(&ctx, &mut rng), Step::Stay);
        assert_eq!(planner.searches_run(), 0);
    }

    #[test]
    fn test_loop_triggers_random_moves_without_search() {
        let map = TileMap::open(10, 10);
        let here = Position::new(5, 5);
        let courier = Courier::new(here, 10.0);
        let jobs = picked_job(Position::new(9, 9));
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut rng = AiRng::seed_from_u64(11);
        let mut planner = planner();

        for pos in [
            Position::new(4, 5),
            here,
            Position::new(6, 5),
            here,
            Position::new(5, 4),
            Position::new(5, 6),
        ] {
            planner.history_mut().push(pos);
        }

        // Pushing the current tile makes three visits in the last six
        let step = planner.plan(&ctx, &mut rng);
        assert!(!step.is_null());
        assert_eq!(planner.loop_break_remaining(), 3);
        assert_eq!(planner.searches_run(), 0);

        for remaining in [2, 1, 0] {
            let step = planner.plan(&ctx, &mut rng);
            assert!(map.is_valid_step(here, step));
            assert_eq!(planner.loop_break_remaining(), remaining);
            assert_eq!(planner.searches_run(), 0);
        }
        assert_eq!(planner.history().len(), 8);
    }

    #[test]
    fn test_depth_zero_falls_back_to_random_valid() {
        let map = TileMap::from_rows(&["BBB", "BCC", "BBB"]);
        let courier = Courier::new(Position::new(1, 1), 10.0);
        let jobs = picked_job(Position::new(2, 1));
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut rng = AiRng::seed_from_u64(5);
        let search = SearchConfig {
            depth: 0,
            ..SearchConfig::default()
        };
        let mut planner = ExpectimaxPlanner::new(search, EvaluationConfig::default());

        let (score, step) = planner.best_move(&ctx);
        assert!(step.is_none());
        assert!(score > 0.0);
        assert_eq!(planner.plan(&ctx, &mut rng), Step::Right);
    }

    #[test]
    fn test_depth_one_is_greedy() {
        let map = TileMap::open(9, 9);
        let courier = Courier::new(Position::new(4, 4), 10.0);
        let jobs = picked_job(Position::new(4, 8));
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let search = SearchConfig {
            depth: 1,
            ..SearchConfig::default()
        };
        let mut planner = ExpectimaxPlanner::new(search, EvaluationConfig::default());
        assert_eq!(planner.best_move(&ctx).1, Some(Step::Down));
    }

    #[test]
    fn test_boxed_in_returns_null() {
        let map = TileMap::from_rows(&["BBB", "BCB", "BBB"]);
        let courier = Courier::new(Position::new(1, 1), 10.0);
        let jobs = picked_job(Position::new(0, 0));
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut rng = AiRng::seed_from_u64(5);
        let mut planner = planner();
        assert_eq!(planner.plan(&ctx, &mut rng), Step::Stay);
    }

    #[test]
    fn test_tie_keeps_first_direction() {
        // A worthless job leaves every direction tied
        let map = TileMap::open(21, 21);
        let courier = Courier::new(Position::new(10, 10), 10.0);
        let jobs = vec![Job::new("tie", Position::new(10, 10), Position::new(0, 0), 0.0)];
        let ctx = DecisionContext::new(&courier, &map).with_jobs(&jobs);
        let mut planner = planner();
        assert_eq!(planner.best_move(&ctx).1, Some(Step::Up));
    }
}
