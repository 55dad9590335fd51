//! Bounded record of recently visited tiles, used to spot oscillation

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::types::Position;

#[derive(Debug, Clone)]
pub struct PositionHistory {
    positions: VecDeque<Position>,
    capacity: usize,
}

impl PositionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            positions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a visit, evicting the oldest entry when full
    pub fn push(&mut self, position: Position) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// Whether one tile appears at least `threshold` times among the last
    /// `window` entries
    pub fn has_loop(&self, window: usize, threshold: usize) -> bool {
        let skip = self.positions.len().saturating_sub(window);
        let mut visits: AHashMap<Position, usize> = AHashMap::new();
        for pos in self.positions.iter().skip(skip) {
            let count = visits.entry(*pos).or_insert(0);
            *count += 1;
            if *count >= threshold {
                return true;
            }
        }
        false
    }
}
