//! Easy tier: uniform random direction
//!
//! No validity checks here; the caller's movement code rejects steps into
//! walls or off the map.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ai::{AiRng, DecisionContext, MovePlanner};
use crate::core::types::{Position, Step};
use crate::world::WorldQuery;

#[derive(Debug, Clone, Default)]
pub struct RandomPlanner;

impl RandomPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl MovePlanner for RandomPlanner {
    fn plan(&mut self, _ctx: &DecisionContext<'_>, rng: &mut AiRng) -> Step {
        Step::DIRECTIONS[rng.gen_range(0..Step::DIRECTIONS.len())]
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// A uniformly chosen step whose destination is on the map and open; the
/// null step when boxed in
pub fn random_valid_step(world: &dyn WorldQuery, from: Position, rng: &mut AiRng) -> Step {
    world
        .valid_steps(from)
        .choose(rng)
        .copied()
        .unwrap_or(Step::Stay)
}
