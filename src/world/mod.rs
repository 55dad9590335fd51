//! City grid queries
//!
//! The decision engine only reads the map through [`WorldQuery`]. The
//! concrete [`TileMap`] is the grid loaded from city-map JSON.

pub mod tile_map;

pub use tile_map::{TileKind, TileMap};

use crate::core::types::{Position, Step};

/// Read-only view of the tile grid
pub trait WorldQuery {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Out-of-bounds tiles count as blocked
    fn is_blocked(&self, x: i32, y: i32) -> bool;

    /// Movement cost of entering a tile
    fn surface_cost(&self, _x: i32, _y: i32) -> f32 {
        1.0
    }

    /// Changes whenever the grid is edited, so cached graphs can tell they are stale
    fn revision(&self) -> u64 {
        0
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width() && pos.y < self.height()
    }

    /// A step is valid when its destination is on the map and not blocked
    fn is_valid_step(&self, from: Position, step: Step) -> bool {
        let to = from.offset(step);
        self.in_bounds(to) && !self.is_blocked(to.x, to.y)
    }

    /// Directional steps out of `from` that are valid, in enumeration order
    fn valid_steps(&self, from: Position) -> Vec<Step> {
        Step::DIRECTIONS
            .into_iter()
            .filter(|step| self.is_valid_step(from, *step))
            .collect()
    }
}
