//! AI tuning loaded from TOML
//!
//! Every section and field falls back to the reference values, so a file
//! only needs to list what it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{CourierError, Result};

/// Deepest search the engine accepts; each extra ply multiplies work by four
pub const MAX_SEARCH_DEPTH: u32 = 6;

/// Tick throttling and tier selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum time between two evaluations
    pub cooldown_ms: u64,
    /// Initial difficulty label: "easy", "medium" or "hard"
    pub difficulty: String,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 500,
            difficulty: "easy".to_string(),
            seed: None,
        }
    }
}

/// Distance-tier multipliers applied to a job's payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMultipliers {
    /// Within `near_tiles`
    pub near: f32,
    /// Within `mid_tiles`
    pub mid: f32,
    /// Beyond `mid_tiles`
    pub far: f32,
}

impl TierMultipliers {
    pub const fn new(near: f32, mid: f32, far: f32) -> Self {
        Self { near, mid, far }
    }
}

/// Weights of the state evaluation function
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// α: weight of expected payout
    pub payout_weight: f32,
    /// β: weight of movement cost
    pub cost_weight: f32,
    /// γ: weight of adverse weather
    pub weather_weight: f32,
    pub near_tiles: i32,
    pub mid_tiles: i32,
    /// Multipliers towards the dropoff of picked-up jobs
    pub picked: TierMultipliers,
    /// Multipliers towards the pickup of accepted jobs
    pub accepted: TierMultipliers,
    /// Multipliers towards the pickup of jobs still on offer
    pub offered: TierMultipliers,
    pub low_stamina_threshold: f32,
    pub low_stamina_cost: f32,
    /// Cost per unit of carried weight
    pub weight_cost: f32,
    /// Cost per unit of multiplier lost to weather
    pub weather_cost_scale: f32,
    /// Penalty per unit of multiplier lost to weather
    pub weather_penalty_scale: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            payout_weight: 2.0,
            cost_weight: 1.0,
            weather_weight: 1.5,
            near_tiles: 15,
            mid_tiles: 30,
            picked: TierMultipliers::new(3.0, 2.0, 1.5),
            accepted: TierMultipliers::new(0.8, 0.5, 0.3),
            offered: TierMultipliers::new(0.6, 0.4, 0.2),
            low_stamina_threshold: 30.0,
            low_stamina_cost: 10.0,
            weight_cost: 0.5,
            weather_cost_scale: 3.0,
            weather_penalty_scale: 5.0,
        }
    }
}

/// Expectimax search and loop recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched; max and chance plies alternate starting with max
    pub depth: u32,
    /// Directions expanded per node, taken in up, down, left, right order
    pub branching: usize,
    /// Positions remembered for loop detection
    pub history_capacity: usize,
    /// Most recent positions inspected for a loop
    pub loop_window: usize,
    /// Visits to one tile within the window that count as a loop
    pub loop_threshold: usize,
    /// Evaluations spent moving randomly after a loop
    pub loop_break_ticks: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            branching: 4,
            history_capacity: 8,
            loop_window: 6,
            loop_threshold: 3,
            loop_break_ticks: 3,
        }
    }
}

/// Weighted city graph and target ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cost of an edge into a blocked tile
    pub blocked_edge_cost: f32,
    /// Edge penalty per unit of multiplier lost to weather
    pub weather_penalty_scale: f32,
    /// Ranking weight of a dropoff for a picked-up job
    pub delivery_priority: f32,
    /// Ranking weight of a pickup for an accepted job
    pub pickup_priority: f32,
    /// Weather drift that forces a graph rebuild
    pub weather_rebuild_epsilon: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            blocked_edge_cost: 10.0,
            weather_penalty_scale: 2.0,
            delivery_priority: 1.0,
            pickup_priority: 2.0,
            weather_rebuild_epsilon: 0.05,
        }
    }
}

/// Complete AI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

impl AiConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load from `data/ai/{name}.toml`
    pub fn load_named(name: &str) -> Result<Self> {
        Self::load(config_path(name))
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.depth > MAX_SEARCH_DEPTH {
            return Err(CourierError::InvalidConfig(format!(
                "search.depth ({}) must be <= {}",
                search.depth, MAX_SEARCH_DEPTH
            )));
        }
        if !(1..=4).contains(&search.branching) {
            return Err(CourierError::InvalidConfig(format!(
                "search.branching ({}) must be between 1 and 4",
                search.branching
            )));
        }
        if search.loop_threshold == 0
            || search.loop_window < search.loop_threshold
            || search.history_capacity < search.loop_window
        {
            return Err(CourierError::InvalidConfig(format!(
                "need history_capacity ({}) >= loop_window ({}) >= loop_threshold ({}) >= 1",
                search.history_capacity, search.loop_window, search.loop_threshold
            )));
        }

        let eval = &self.evaluation;
        if eval.near_tiles < 0 || eval.mid_tiles < eval.near_tiles {
            return Err(CourierError::InvalidConfig(format!(
                "distance tiers must satisfy 0 <= near_tiles ({}) <= mid_tiles ({})",
                eval.near_tiles, eval.mid_tiles
            )));
        }
        if eval.payout_weight < 0.0 || eval.cost_weight < 0.0 || eval.weather_weight < 0.0 {
            return Err(CourierError::InvalidConfig(
                "evaluation weights must be non-negative".into(),
            ));
        }

        let graph = &self.graph;
        if graph.blocked_edge_cost <= 0.0 || graph.weather_penalty_scale < 0.0 {
            return Err(CourierError::InvalidConfig(
                "graph costs must be positive".into(),
            ));
        }
        if graph.delivery_priority <= 0.0 || graph.pickup_priority <= 0.0 {
            return Err(CourierError::InvalidConfig(
                "target priorities must be positive".into(),
            ));
        }

        Ok(())
    }
}

fn config_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai").join(format!("{}.toml", name))
}
