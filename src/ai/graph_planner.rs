//! Hard tier: economic target selection over shortest paths
//!
//! Each replan ranks the courier's job stops by
//! `payout × priority / (path_cost + 1)`, walks the cheapest path to the
//! winner and caches the remaining steps. Cached steps are replayed until
//! the target is reached or the world invalidates them.

use std::collections::VecDeque;

use crate::ai::config::GraphConfig;
use crate::ai::graph::{BuildStamp, CityGraph, ShortestPaths};
use crate::ai::{AiRng, DecisionContext, MovePlanner};
use crate::core::types::{Position, Step};
use crate::jobs::JobView;

/// Steps still to walk towards a target
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPath {
    pub target: Position,
    pub steps: VecDeque<Step>,
    /// Where the courier must stand for the next step to make sense
    pub expected_from: Position,
}

impl CachedPath {
    /// Tile the remaining steps end on
    pub fn end(&self) -> Position {
        self.steps
            .iter()
            .fold(self.expected_from, |pos, step| pos.offset(*step))
    }
}

/// Why a job stop is worth visiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Delivery,
    Pickup,
}

/// A candidate destination drawn from the courier's jobs
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    pub position: Position,
    pub payout: f32,
    pub priority: f32,
    pub kind: TargetKind,
}

impl TargetCandidate {
    /// Ranking score given the path cost to reach it
    pub fn score(&self, path_cost: f32) -> f32 {
        self.payout * self.priority / (path_cost + 1.0)
    }
}

/// Dropoffs of picked-up jobs, then pickups of accepted ones
pub fn collect_targets(jobs: &dyn JobView, config: &GraphConfig) -> Vec<TargetCandidate> {
    let accepted = jobs.accepted_jobs();
    let deliveries = accepted
        .iter()
        .filter(|job| job.is_picked_up())
        .map(|job| TargetCandidate {
            position: job.dropoff,
            payout: job.payout,
            priority: config.delivery_priority,
            kind: TargetKind::Delivery,
        });
    let pickups = accepted
        .iter()
        .filter(|job| !job.is_picked_up())
        .map(|job| TargetCandidate {
            position: job.pickup,
            payout: job.payout,
            priority: config.pickup_priority,
            kind: TargetKind::Pickup,
        });
    deliveries.chain(pickups).collect()
}

/// Best reachable candidate and its score; earlier candidates win ties
pub fn rank_targets<'c>(
    candidates: &'c [TargetCandidate],
    paths: &ShortestPaths,
) -> Option<(&'c TargetCandidate, f32)> {
    let mut best: Option<(&TargetCandidate, f32)> = None;
    for candidate in candidates {
        let Some(cost) = paths.cost_to(candidate.position) else {
            continue;
        };
        let score = candidate.score(cost);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best
}

#[derive(Debug, Clone)]
pub struct GraphPlanner {
    config: GraphConfig,
    graph: Option<CityGraph>,
    stale: bool,
    cache: Option<CachedPath>,
    rebuilds: u64,
}

impl GraphPlanner {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            graph: None,
            stale: true,
            cache: None,
            rebuilds: 0,
        }
    }

    pub fn graph(&self) -> Option<&CityGraph> {
        self.graph.as_ref()
    }

    pub fn cached_path(&self) -> Option<&CachedPath> {
        self.cache.as_ref()
    }

    pub fn target(&self) -> Option<Position> {
        self.cache.as_ref().map(|cache| cache.target)
    }

    /// How many times the graph has been built
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Force a rebuild on the next evaluation
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    fn ensure_graph(&mut self, ctx: &DecisionContext<'_>) -> &CityGraph {
        let stamp = BuildStamp::of(ctx.world, ctx.weather_multiplier());
        let epsilon = self.config.weather_rebuild_epsilon;
        let graph = match self.graph.take() {
            Some(graph) if !self.stale && graph.stamp().matches(&stamp, epsilon) => graph,
            _ => {
                let graph = CityGraph::build(ctx.world, stamp.weather_multiplier, &self.config);
                tracing::debug!(
                    "Built city graph: {} nodes, {} edges (weather x{:.2})",
                    graph.node_count(),
                    graph.edge_count(),
                    stamp.weather_multiplier
                );
                self.stale = false;
                self.rebuilds += 1;
                graph
            }
        };
        self.graph.insert(graph)
    }

    /// Replay the cache if it still applies
    fn follow_cache(&mut self, ctx: &DecisionContext<'_>, position: Position) -> Option<Step> {
        let target = self.cache.as_ref()?.target;
        let still_wanted = ctx.jobs.is_some_and(|jobs| {
            collect_targets(jobs, &self.config)
                .iter()
                .any(|candidate| candidate.position == target)
        });
        if !still_wanted {
            tracing::debug!("Target {} no longer belongs to any job, replanning", target);
            self.cache = None;
            return None;
        }

        let cache = self.cache.as_mut()?;
        if position == cache.target {
            tracing::debug!("Reached target {}", cache.target);
            self.cache = None;
            return None;
        }
        if position != cache.expected_from {
            tracing::debug!(
                "Courier at {} but path continues from {}, replanning",
                position,
                cache.expected_from
            );
            self.cache = None;
            return None;
        }

        match cache.steps.pop_front() {
            Some(step) if ctx.world.is_valid_step(position, step) => {
                cache.expected_from = position.offset(step);
                Some(step)
            }
            Some(step) => {
                tracing::debug!(
                    "Cached step {:?} from {} is blocked, discarding path",
                    step,
                    position
                );
                self.cache = None;
                None
            }
            None => {
                self.cache = None;
                None
            }
        }
    }

    fn replan(&mut self, ctx: &DecisionContext<'_>, position: Position) -> Step {
        let Some(jobs) = ctx.jobs else {
            return Step::Stay;
        };
        let candidates = collect_targets(jobs, &self.config);
        if candidates.is_empty() {
            return Step::Stay;
        }

        let graph = self.ensure_graph(ctx);
        let paths = graph.dijkstra(position);
        let Some((target, score)) = rank_targets(&candidates, &paths) else {
            tracing::debug!("No reachable target from {}", position);
            return Step::Stay;
        };
        let target = target.clone();

        let Some(path) = paths.path_to(target.position) else {
            return Step::Stay;
        };
        if path.len() < 2 {
            return Step::Stay;
        }

        let mut steps: VecDeque<Step> = path
            .windows(2)
            .filter_map(|pair| pair[0].step_to(&pair[1]))
            .collect();
        let Some(first) = steps.pop_front() else {
            return Step::Stay;
        };

        if !ctx.world.is_valid_step(position, first) {
            // Cheapest route starts through an obstacle; wait for the next tick
            tracing::debug!("Path to {} starts blocked at {}", target.position, position);
            return Step::Stay;
        }

        tracing::debug!(
            "Heading for {:?} at {} (score {:.2}, {} steps)",
            target.kind,
            target.position,
            score,
            path.len() - 1
        );
        self.cache = Some(CachedPath {
            target: target.position,
            steps,
            expected_from: position.offset(first),
        });
        first
    }
}

impl MovePlanner for GraphPlanner {
    fn plan(&mut self, ctx: &DecisionContext<'_>, _rng: &mut AiRng) -> Step {
        if ctx.agent.is_exhausted() {
            return Step::Stay;
        }

        self.ensure_graph(ctx);
        let position = ctx.agent.position();

        if let Some(step) = self.follow_cache(ctx, position) {
            return step;
        }
        self.replan(ctx, position)
    }

    fn reset(&mut self) {
        self.cache = None;
    }

    fn name(&self) -> &'static str {
        "graph"
    }
}
