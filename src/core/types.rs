//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Tile coordinate on the city grid
///
/// Serialized as a `[x, y]` pair, the shape job files use for pickup and
/// dropoff tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[display(fmt = "({}, {})", x, y)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position reached by taking `step` from here
    pub fn offset(&self, step: Step) -> Self {
        let (dx, dy) = step.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// L1 distance in tiles
    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The step that moves from `self` onto an adjacent `other`
    pub fn step_to(&self, other: &Position) -> Option<Step> {
        Step::from_delta(other.x - self.x, other.y - self.y)
    }

    /// The four axis-aligned neighbors in up, down, left, right order
    pub fn neighbors(&self) -> [Position; 4] {
        Step::DIRECTIONS.map(|step| self.offset(step))
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.x, pos.y)
    }
}

/// A single-tile move, or the null move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Stay,
    Up,
    Down,
    Left,
    Right,
}

impl Step {
    /// Directional steps in enumeration order; search ties resolve to the
    /// earliest entry.
    pub const DIRECTIONS: [Step; 4] = [Step::Up, Step::Down, Step::Left, Step::Right];

    /// Every legal output of the engine
    pub const ALL: [Step; 5] = [Step::Stay, Step::Up, Step::Down, Step::Left, Step::Right];

    /// `(dx, dy)` in tile units; y grows downwards
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Step::Stay => (0, 0),
            Step::Up => (0, -1),
            Step::Down => (0, 1),
            Step::Left => (-1, 0),
            Step::Right => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Step> {
        match (dx, dy) {
            (0, 0) => Some(Step::Stay),
            (0, -1) => Some(Step::Up),
            (0, 1) => Some(Step::Down),
            (-1, 0) => Some(Step::Left),
            (1, 0) => Some(Step::Right),
            _ => None,
        }
    }

    pub fn is_null(self) -> bool {
        matches!(self, Step::Stay)
    }
}

/// Identifier of a delivery job, as given by the job feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
