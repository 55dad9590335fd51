//! Markov weather with smooth transitions
//!
//! A condition holds for a burst of 45-60 seconds. When the burst ends the
//! next condition is drawn from the transition table, and the multiplier
//! slides linearly to its new value over 3-5 seconds.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{CourierError, Result};
use crate::weather::WeatherView;

/// Weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Clear,
    Clouds,
    RainLight,
    Rain,
    Storm,
    Fog,
    Wind,
    Heat,
    Cold,
}

impl Condition {
    pub const ALL: [Condition; 9] = [
        Self::Clear,
        Self::Clouds,
        Self::RainLight,
        Self::Rain,
        Self::Storm,
        Self::Fog,
        Self::Wind,
        Self::Heat,
        Self::Cold,
    ];

    /// Base speed multiplier (1.0 = normal)
    pub fn base_multiplier(&self) -> f32 {
        match self {
            Self::Clear => 1.0,
            Self::Clouds => 0.98,
            Self::RainLight => 0.9,
            Self::Rain => 0.85,
            Self::Storm => 0.75,
            Self::Fog => 0.88,
            Self::Wind => 0.92,
            Self::Heat => 0.90,
            Self::Cold => 0.92,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Clouds => "clouds",
            Self::RainLight => "rain_light",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Fog => "fog",
            Self::Wind => "wind",
            Self::Heat => "heat",
            Self::Cold => "cold",
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::Clear
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Condition {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| CourierError::InvalidWeather(format!("unknown condition {:?}", s)))
    }
}

/// Snapshot for HUDs and logs
#[derive(Debug, Clone, Serialize)]
pub struct WeatherStatus {
    pub condition: Condition,
    pub multiplier: f32,
    pub intensity: f32,
    pub burst_remaining: f32,
    pub transitioning: bool,
}

#[derive(Debug, Clone)]
struct Transition {
    target: Condition,
    target_multiplier: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Deserialize)]
struct InitialWeather {
    condition: String,
    #[serde(default)]
    intensity: f32,
}

#[derive(Debug, Deserialize)]
struct RawWeather {
    #[serde(default)]
    city: String,
    transition: BTreeMap<String, BTreeMap<String, f32>>,
    initial: InitialWeather,
}

#[derive(Debug, Deserialize)]
struct WeatherDocument {
    data: RawWeather,
}

/// Stateful weather simulation
#[derive(Debug, Clone)]
pub struct WeatherModel {
    pub city: String,
    condition: Condition,
    multiplier: f32,
    intensity: f32,
    burst_remaining: f32,
    transition: Option<Transition>,
    /// Outgoing probabilities per condition, kept in a fixed order so a seed
    /// reproduces the same sequence
    table: BTreeMap<Condition, Vec<(Condition, f32)>>,
    rng: ChaCha8Rng,
}

impl WeatherModel {
    /// Clear skies with no transitions; useful as a neutral default
    pub fn new(condition: Condition, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let burst_remaining = roll_burst(&mut rng);
        Self {
            city: String::new(),
            condition,
            multiplier: condition.base_multiplier(),
            intensity: 0.0,
            burst_remaining,
            transition: None,
            table: BTreeMap::new(),
            rng,
        }
    }

    /// Add or replace the outgoing probabilities of a condition
    pub fn with_transitions(mut self, from: Condition, to: &[(Condition, f32)]) -> Self {
        self.table.insert(from, to.to_vec());
        self
    }

    /// Parse a city weather document (`{"data": {...}}`)
    pub fn from_json_str(json: &str, seed: u64) -> Result<Self> {
        let document: WeatherDocument = serde_json::from_str(json)?;
        let raw = document.data;

        let initial: Condition = raw.initial.condition.parse()?;
        let mut model = Self::new(initial, seed);
        model.city = raw.city;
        model.intensity = raw.initial.intensity.clamp(0.0, 1.0);

        for (from, row) in raw.transition {
            let from: Condition = from.parse()?;
            let mut targets = Vec::with_capacity(row.len());
            for (to, weight) in row {
                if weight < 0.0 {
                    return Err(CourierError::InvalidWeather(format!(
                        "negative probability {} for {} -> {}",
                        weight, from, to
                    )));
                }
                targets.push((to.parse()?, weight));
            }
            model.table.insert(from, targets);
        }

        Ok(model)
    }

    /// Load a city weather file from disk
    pub fn load(path: impl AsRef<Path>, seed: u64) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents, seed)
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn status(&self) -> WeatherStatus {
        WeatherStatus {
            condition: self.condition,
            multiplier: self.multiplier,
            intensity: self.intensity,
            burst_remaining: self.burst_remaining,
            transitioning: self.is_transitioning(),
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        match self.transition.as_mut() {
            None => {
                self.burst_remaining -= dt;
                if self.burst_remaining <= 0.0 {
                    self.begin_transition();
                }
            }
            Some(transition) => {
                transition.elapsed += dt;
                let alpha = (transition.elapsed / transition.duration).min(1.0);
                let start = self.condition.base_multiplier();
                self.multiplier = (1.0 - alpha) * start + alpha * transition.target_multiplier;

                if transition.elapsed >= transition.duration {
                    let target = transition.target;
                    let target_multiplier = transition.target_multiplier;
                    tracing::debug!(
                        "Weather settled: {} -> {} (x{:.2})",
                        self.condition,
                        target,
                        target_multiplier
                    );
                    self.condition = target;
                    self.multiplier = target_multiplier;
                    self.transition = None;
                    self.burst_remaining = roll_burst(&mut self.rng);
                }
            }
        }
    }

    fn begin_transition(&mut self) {
        let target = self.next_condition();
        self.intensity = self.rng.gen_range(0.0..1.0);
        let target_multiplier = target.base_multiplier() * (0.8 + 0.2 * self.intensity);
        let duration = self.rng.gen_range(3.0..5.0);

        self.transition = Some(Transition {
            target,
            target_multiplier,
            elapsed: 0.0,
            duration,
        });
    }

    /// Weighted draw from the current condition's row; stays put without one
    fn next_condition(&mut self) -> Condition {
        let Some(row) = self.table.get(&self.condition) else {
            return self.condition;
        };
        match WeightedIndex::new(row.iter().map(|(_, w)| *w)) {
            Ok(dist) => row[dist.sample(&mut self.rng)].0,
            Err(_) => self.condition,
        }
    }
}

fn roll_burst(rng: &mut ChaCha8Rng) -> f32 {
    rng.gen_range(45..=60) as f32
}

impl WeatherView for WeatherModel {
    fn current_multiplier(&self) -> f32 {
        self.multiplier
    }
}
