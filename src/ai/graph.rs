//! Weighted city graph and Dijkstra shortest paths
//!
//! Nodes are every open tile plus every blocked tile touching an open one,
//! so edges into obstacles exist but cost `blocked_edge_cost`. Open
//! destinations cost their surface weight plus a weather penalty.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::ai::config::GraphConfig;
use crate::core::types::Position;
use crate::world::WorldQuery;

/// Directed edge to a neighboring tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: Position,
    pub cost: f32,
}

/// Inputs a graph was built from; a mismatch means it is stale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildStamp {
    pub width: i32,
    pub height: i32,
    pub revision: u64,
    pub weather_multiplier: f32,
}

impl BuildStamp {
    pub fn of(world: &dyn WorldQuery, weather_multiplier: f32) -> Self {
        Self {
            width: world.width(),
            height: world.height(),
            revision: world.revision(),
            weather_multiplier,
        }
    }

    /// Same map and weather within `epsilon`
    pub fn matches(&self, other: &BuildStamp, epsilon: f32) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.revision == other.revision
            && (self.weather_multiplier - other.weather_multiplier).abs() <= epsilon
    }
}

#[derive(Debug, Clone)]
pub struct CityGraph {
    adjacency: AHashMap<Position, Vec<Edge>>,
    stamp: BuildStamp,
}

/// Dijkstra needs non-negative weights; unusable costs count as walls
fn sanitize_cost(cost: f32, fallback: f32) -> f32 {
    if cost.is_finite() {
        cost.max(0.0)
    } else {
        fallback
    }
}

impl CityGraph {
    /// Build the graph for the current world and weather
    pub fn build(world: &dyn WorldQuery, weather_multiplier: f32, config: &GraphConfig) -> Self {
        let is_open = |pos: Position| world.in_bounds(pos) && !world.is_blocked(pos.x, pos.y);

        let mut adjacency: AHashMap<Position, Vec<Edge>> = AHashMap::new();
        for y in 0..world.height() {
            for x in 0..world.width() {
                let pos = Position::new(x, y);
                if is_open(pos) || pos.neighbors().into_iter().any(is_open) {
                    adjacency.insert(pos, Vec::with_capacity(4));
                }
            }
        }

        let weather_penalty = if weather_multiplier < 1.0 {
            (1.0 - weather_multiplier) * config.weather_penalty_scale
        } else {
            0.0
        };

        let nodes: Vec<Position> = adjacency.keys().copied().collect();
        for from in nodes {
            let edges: Vec<Edge> = from
                .neighbors()
                .into_iter()
                .filter(|to| adjacency.contains_key(to))
                .map(|to| {
                    let cost = if world.is_blocked(to.x, to.y) {
                        config.blocked_edge_cost
                    } else {
                        world.surface_cost(to.x, to.y) + weather_penalty
                    };
                    Edge {
                        to,
                        cost: sanitize_cost(cost, config.blocked_edge_cost),
                    }
                })
                .collect();
            if let Some(slot) = adjacency.get_mut(&from) {
                *slot = edges;
            }
        }

        Self {
            adjacency,
            stamp: BuildStamp::of(world, weather_multiplier),
        }
    }

    pub fn stamp(&self) -> &BuildStamp {
        &self.stamp
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.adjacency.contains_key(&pos)
    }

    /// Outgoing edges in up, down, left, right order
    pub fn edges(&self, pos: Position) -> &[Edge] {
        self.adjacency.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_cost(&self, from: Position, to: Position) -> Option<f32> {
        self.edges(from)
            .iter()
            .find(|edge| edge.to == to)
            .map(|edge| edge.cost)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Position> {
        self.adjacency.keys()
    }

    /// Single-source shortest paths from `source`
    pub fn dijkstra(&self, source: Position) -> ShortestPaths {
        self.run_dijkstra(source, None)
    }

    /// Cheapest path and its cost; the path includes both endpoints
    pub fn shortest_path(&self, from: Position, to: Position) -> Option<(Vec<Position>, f32)> {
        let paths = self.run_dijkstra(from, Some(to));
        Some((paths.path_to(to)?, paths.cost_to(to)?))
    }

    fn run_dijkstra(&self, source: Position, goal: Option<Position>) -> ShortestPaths {
        let mut paths = ShortestPaths {
            source,
            dist: AHashMap::new(),
            prev: AHashMap::new(),
        };
        if !self.contains(source) {
            return paths;
        }

        let mut open_set = BinaryHeap::new();
        paths.dist.insert(source, 0.0);
        open_set.push(Frontier {
            cost: OrderedFloat(0.0),
            pos: source,
        });

        while let Some(Frontier { cost, pos }) = open_set.pop() {
            let best = paths.dist.get(&pos).copied().unwrap_or(f32::INFINITY);
            if cost.0 > best {
                continue; // stale entry
            }
            if goal == Some(pos) {
                break;
            }

            for edge in self.edges(pos) {
                let tentative = cost.0 + edge.cost;
                let known = paths.dist.get(&edge.to).copied().unwrap_or(f32::INFINITY);
                if tentative < known {
                    paths.dist.insert(edge.to, tentative);
                    paths.prev.insert(edge.to, pos);
                    open_set.push(Frontier {
                        cost: OrderedFloat(tentative),
                        pos: edge.to,
                    });
                }
            }
        }

        paths
    }
}

/// Entry in the Dijkstra open set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    cost: OrderedFloat<f32>,
    pos: Position,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; row-major position breaks ties
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| (other.pos.y, other.pos.x).cmp(&(self.pos.y, self.pos.x)))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a single-source Dijkstra run
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: Position,
    dist: AHashMap<Position, f32>,
    prev: AHashMap<Position, Position>,
}

impl ShortestPaths {
    pub fn source(&self) -> Position {
        self.source
    }

    /// Total edge cost to `target`, None when unreachable
    pub fn cost_to(&self, target: Position) -> Option<f32> {
        self.dist.get(&target).copied()
    }

    /// Node sequence from the source to `target`, inclusive
    pub fn path_to(&self, target: Position) -> Option<Vec<Position>> {
        if !self.dist.contains_key(&target) {
            return None;
        }
        let mut path = vec![target];
        let mut current = target;
        while let Some(&prev) = self.prev.get(&current) {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }
}
