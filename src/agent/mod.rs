//! The courier the engine drives
//!
//! The engine reads the agent through [`AgentView`]; applying the chosen
//! step, spending stamina and resolving collisions stay with [`Courier`].

pub mod courier;

pub use courier::{Courier, StaminaModel};

use crate::core::types::Position;

/// Read-only view of an agent
pub trait AgentView {
    fn position(&self) -> Position;

    fn stamina(&self) -> f32;

    /// Exhausted agents cannot move until they recover
    fn is_exhausted(&self) -> bool;

    fn carried_weight(&self) -> f32;
}
