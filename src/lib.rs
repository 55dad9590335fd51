//! Courier AI - autonomous courier decision engine
//!
//! Picks one movement step per evaluation tick for a non-player courier,
//! across three difficulty tiers. The world, weather and job board are
//! read through narrow traits; the crate also ships headless
//! implementations of them for simulation and tests.

pub mod agent;
pub mod ai;
pub mod core;
pub mod jobs;
pub mod weather;
pub mod world;
