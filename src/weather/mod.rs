//! Weather feeding the couriers' speed multiplier
//!
//! The decision engine only needs the current multiplier, read through
//! [`WeatherView`]. Values below 1.0 are adverse conditions.

pub mod model;

pub use model::{Condition, WeatherModel, WeatherStatus};

/// Read-only view of the current weather
pub trait WeatherView {
    /// Speed multiplier in `(0, ~1.1]`
    fn current_multiplier(&self) -> f32;
}

/// Weather that never changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeather(pub f32);

impl Default for FixedWeather {
    fn default() -> Self {
        Self(1.0)
    }
}

impl WeatherView for FixedWeather {
    fn current_multiplier(&self) -> f32 {
        self.0
    }
}

/// Multiplier to use when weather may be absent
pub fn multiplier_or_clear(weather: Option<&dyn WeatherView>) -> f32 {
    weather.map_or(1.0, |w| w.current_multiplier())
}
