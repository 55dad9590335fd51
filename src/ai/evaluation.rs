//! State evaluation for the expectimax tier
//!
//! `score = α·payout − β·cost − γ·weather_penalty`
//!
//! Payout favours being close to where jobs need the courier next. Cost
//! punishes low stamina, heavy loads and bad weather. The function is pure.

use serde::Serialize;

use crate::ai::config::{EvaluationConfig, TierMultipliers};
use crate::ai::AgentSnapshot;
use crate::core::types::Position;
use crate::jobs::{Job, JobView};
use crate::weather::WeatherView;

/// Terms of a single evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub payout: f32,
    pub cost: f32,
    pub weather_penalty: f32,
    pub total: f32,
}

/// Score a hypothetical state
pub fn evaluate(
    state: &AgentSnapshot,
    weather: Option<&dyn WeatherView>,
    jobs: Option<&dyn JobView>,
    config: &EvaluationConfig,
) -> f32 {
    score_breakdown(state, weather, jobs, config).total
}

/// Score a hypothetical state and keep the individual terms
pub fn score_breakdown(
    state: &AgentSnapshot,
    weather: Option<&dyn WeatherView>,
    jobs: Option<&dyn JobView>,
    config: &EvaluationConfig,
) -> ScoreBreakdown {
    let multiplier = crate::weather::multiplier_or_clear(weather);
    let adverse = if multiplier < 1.0 { 1.0 - multiplier } else { 0.0 };

    let payout = jobs.map_or(0.0, |jobs| expected_payout(state.position, jobs, config));

    let mut cost = 0.0;
    if state.stamina < config.low_stamina_threshold {
        cost += config.low_stamina_cost;
    }
    cost += config.weight_cost * state.carried_weight;
    cost += adverse * config.weather_cost_scale;

    let weather_penalty = adverse * config.weather_penalty_scale;

    let total = config.payout_weight * payout
        - config.cost_weight * cost
        - config.weather_weight * weather_penalty;

    ScoreBreakdown {
        payout,
        cost,
        weather_penalty,
        total,
    }
}

fn expected_payout(from: Position, jobs: &dyn JobView, config: &EvaluationConfig) -> f32 {
    let accepted = jobs.accepted_jobs();
    let mut payout = 0.0;

    for job in accepted {
        payout += if job.is_picked_up() {
            discounted(job, from, job.dropoff, &config.picked, config)
        } else {
            discounted(job, from, job.pickup, &config.accepted, config)
        };
    }

    for job in jobs.offered_jobs() {
        if accepted.iter().any(|a| a.id == job.id) {
            continue;
        }
        payout += discounted(job, from, job.pickup, &config.offered, config);
    }

    payout
}

/// `payout / (distance + 1)` scaled by the distance tier
fn discounted(
    job: &Job,
    from: Position,
    to: Position,
    tiers: &TierMultipliers,
    config: &EvaluationConfig,
) -> f32 {
    let distance = from.manhattan(&to);
    let multiplier = if distance <= config.near_tiles {
        tiers.near
    } else if distance <= config.mid_tiles {
        tiers.mid
    } else {
        tiers.far
    };
    job.payout / (distance as f32 + 1.0) * multiplier
}
