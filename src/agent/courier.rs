//! Courier movement, stamina and scoring
//!
//! Moving spends stamina in proportion to the load and the surface. At zero
//! stamina the courier is exhausted and stays put until it has recovered to
//! the resume threshold.

use serde::{Deserialize, Serialize};

use crate::agent::AgentView;
use crate::core::error::Result;
use crate::core::types::{JobId, Position, Step};
use crate::jobs::{Inventory, Job};
use crate::weather::WeatherView;
use crate::world::WorldQuery;

/// Tunables for stamina drain and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaminaModel {
    pub max: f32,
    /// Drain per tile before load and surface adjustments
    pub base_cost: f32,
    /// Load carried for free
    pub free_weight: f32,
    /// Extra drain per unit of load above `free_weight`
    pub weight_cost: f32,
    /// Stamina regained per second of rest
    pub recovery_rate: f32,
    /// Exhaustion lifts once stamina reaches this value
    pub resume_threshold: f32,
}

impl Default for StaminaModel {
    fn default() -> Self {
        Self {
            max: 100.0,
            base_cost: 0.5,
            free_weight: 3.0,
            weight_cost: 0.2,
            recovery_rate: 5.0,
            resume_threshold: 30.0,
        }
    }
}

/// Tiles per second at full condition
const BASE_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub position: Position,
    pub stamina: f32,
    pub exhausted: bool,
    pub reputation: f32,
    pub score: f32,
    pub inventory: Inventory,
    #[serde(default)]
    pub stamina_model: StaminaModel,
}

impl Courier {
    pub fn new(position: Position, max_weight: f32) -> Self {
        let stamina_model = StaminaModel::default();
        Self {
            position,
            stamina: stamina_model.max,
            exhausted: false,
            reputation: 100.0,
            score: 0.0,
            inventory: Inventory::new(max_weight),
            stamina_model,
        }
    }

    pub fn with_stamina(mut self, stamina: f32) -> Self {
        self.stamina = stamina.clamp(0.0, self.stamina_model.max);
        self
    }

    /// Apply a step chosen by the engine; returns whether the courier moved
    pub fn apply_step(&mut self, step: Step, world: &dyn WorldQuery) -> bool {
        if self.exhausted || step.is_null() {
            return false;
        }
        let target = self.position.offset(step);
        if !world.in_bounds(target) || world.is_blocked(target.x, target.y) {
            return false;
        }

        self.position = target;
        self.drain(world.surface_cost(target.x, target.y));
        true
    }

    fn drain(&mut self, surface: f32) {
        let model = &self.stamina_model;
        let extra = (self.inventory.carried_weight() - model.free_weight).max(0.0) * model.weight_cost;
        self.stamina = (self.stamina - (model.base_cost + extra) * surface).max(0.0);

        if self.stamina <= 0.0 {
            self.exhausted = true;
        }
        if self.exhausted && self.stamina >= model.resume_threshold {
            self.exhausted = false;
        }
    }

    /// Rest for `secs` seconds
    pub fn recover(&mut self, secs: f32) {
        let model = &self.stamina_model;
        self.stamina = (self.stamina + model.recovery_rate * secs).min(model.max);
        if self.exhausted && self.stamina >= model.resume_threshold {
            self.exhausted = false;
        }
    }

    /// Tiles per second given stamina, load, reputation, surface and weather
    pub fn speed(&self, world: &dyn WorldQuery, weather: Option<&dyn WeatherView>) -> f32 {
        let stamina_factor = if self.stamina > self.stamina_model.resume_threshold {
            1.0
        } else {
            0.8
        };
        let over = (self.inventory.carried_weight() - self.stamina_model.free_weight).max(0.0);
        let weight_factor = (1.0 - 0.03 * over).max(0.8);
        let reputation_factor = if self.reputation >= 90.0 { 1.03 } else { 1.0 };
        let surface = world.surface_cost(self.position.x, self.position.y);
        let climate = crate::weather::multiplier_or_clear(weather);

        BASE_SPEED * stamina_factor * weight_factor * reputation_factor * surface * climate
    }

    pub fn accept(&mut self, job: Job) -> Result<()> {
        self.inventory.accept(job)
    }

    /// Pick up every accepted job whose pickup is the current tile
    pub fn try_pick_up(&mut self) -> Vec<JobId> {
        let here = self.position;
        let ready: Vec<JobId> = self
            .inventory
            .jobs()
            .iter()
            .filter(|job| !job.is_picked_up() && job.pickup == here)
            .map(|job| job.id.clone())
            .collect();

        ready
            .into_iter()
            .filter(|id| matches!(self.inventory.pick_up(id, here), Ok(true)))
            .collect()
    }

    /// Deliver every picked-up job whose dropoff is the current tile
    pub fn try_deliver(&mut self) -> Vec<(JobId, f32)> {
        let here = self.position;
        let ready: Vec<JobId> = self
            .inventory
            .jobs()
            .iter()
            .filter(|job| job.is_picked_up() && job.dropoff == here)
            .map(|job| job.id.clone())
            .collect();

        let mut delivered = Vec::with_capacity(ready.len());
        for id in ready {
            if let Some(payout) = self.inventory.deliver(&id, here) {
                self.score += payout;
                delivered.push((id, payout));
            }
        }
        delivered
    }
}

impl AgentView for Courier {
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
        self.inventory.carried_weight()
    }
}
