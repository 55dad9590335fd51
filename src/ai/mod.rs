//! Courier AI: picks one step per evaluation tick
//!
//! Architecture: one [`MovePlanner`] per difficulty tier, selected by
//! [`Difficulty`] and throttled by the [`AiEngine`] dispatcher.
//! - easy: [`RandomPlanner`], uniform random direction
//! - medium: [`ExpectimaxPlanner`], shallow max/average search with loop recovery
//! - hard: [`GraphPlanner`], shortest paths over a weighted city graph
//!
//! Planners read the world through the collaborator traits in
//! [`DecisionContext`] and never mutate it.

pub mod config;
pub mod engine;
pub mod evaluation;
pub mod expectimax;
pub mod graph;
pub mod graph_planner;
pub mod history;
pub mod random;

pub use config::{AiConfig, DispatchConfig, EvaluationConfig, GraphConfig, SearchConfig};
pub use engine::AiEngine;
pub use evaluation::{evaluate, score_breakdown, ScoreBreakdown};
pub use expectimax::ExpectimaxPlanner;
pub use graph::{CityGraph, ShortestPaths};
pub use graph_planner::{
    collect_targets, rank_targets, CachedPath, GraphPlanner, TargetCandidate, TargetKind,
};
pub use history::PositionHistory;
pub use random::{random_valid_step, RandomPlanner};

use std::fmt;
use std::str::FromStr;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agent::AgentView;
use crate::core::error::CourierError;
use crate::core::types::{Position, Step};
use crate::jobs::JobView;
use crate::weather::WeatherView;
use crate::world::WorldQuery;

/// RNG shared by the tiers of one engine
pub type AiRng = ChaCha8Rng;

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(CourierError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Everything a planner may read during one evaluation
#[derive(Clone, Copy)]
pub struct DecisionContext<'a> {
    pub agent: &'a dyn AgentView,
    pub world: &'a dyn WorldQuery,
    pub weather: Option<&'a dyn WeatherView>,
    pub jobs: Option<&'a dyn JobView>,
}

impl<'a> DecisionContext<'a> {
    pub fn new(agent: &'a dyn AgentView, world: &'a dyn WorldQuery) -> Self {
        Self {
            agent,
            world,
            weather: None,
            jobs: None,
        }
    }

    pub fn with_weather(mut self, weather: &'a dyn WeatherView) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_jobs(mut self, jobs: &'a dyn JobView) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Current multiplier; clear skies when no weather is attached
    pub fn weather_multiplier(&self) -> f32 {
        crate::weather::multiplier_or_clear(self.weather)
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::of(self.agent)
    }
}

/// Hypothetical agent state explored during search
///
/// Built fresh for every node, holding only what evaluation reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub position: Position,
    pub stamina: f32,
    pub exhausted: bool,
    pub carried_weight: f32,
}

impl AgentSnapshot {
    pub fn of(agent: &dyn AgentView) -> Self {
        Self {
            position: agent.position(),
            stamina: agent.stamina(),
            exhausted: agent.is_exhausted(),
            carried_weight: agent.carried_weight(),
        }
    }

    /// The same agent one step further
    pub fn moved(&self, step: Step) -> Self {
        Self {
            position: self.position.offset(step),
            ..*self
        }
    }
}

impl AgentView for AgentSnapshot {
    fn position(&self) -> Position {
        self.position
    }

    fn stamina(&self) -> f32 {
        self.stamina
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn carried_weight(&self) -> f32 {
        self.carried_weight
    }
}

/// One difficulty tier's decision strategy
pub trait MovePlanner {
    /// Choose the next step; never fails, degrades to [`Step::Stay`]
    fn plan(&mut self, ctx: &DecisionContext<'_>, rng: &mut AiRng) -> Step;

    /// Drop per-agent state such as history or cached paths
    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}
