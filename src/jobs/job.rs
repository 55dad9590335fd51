//! Delivery job record

use serde::{Deserialize, Serialize};

use crate::core::types::{JobId, Position};

/// A parcel to carry from `pickup` to `dropoff`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pickup: Position,
    pub dropoff: Position,
    pub payout: f32,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub priority: u32,
    /// Seconds since the start of the shift; None = no deadline
    #[serde(default)]
    pub deadline: Option<f32>,
    /// Seconds since the start of the shift before the job is offered
    #[serde(default)]
    pub release_time: f32,
    #[serde(default)]
    pub picked_up: bool,
}

impl Job {
    pub fn new(id: impl Into<String>, pickup: Position, dropoff: Position, payout: f32) -> Self {
        Self {
            id: JobId::new(id),
            pickup,
            dropoff,
            payout,
            weight: 1.0,
            priority: 0,
            deadline: None,
            release_time: 0.0,
            picked_up: false,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: f32) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_release_time(mut self, release_time: f32) -> Self {
        self.release_time = release_time;
        self
    }

    pub fn is_picked_up(&self) -> bool {
        self.picked_up
    }

    /// Where the courier should head next for this job
    pub fn next_stop(&self) -> Position {
        if self.picked_up {
            self.dropoff
        } else {
            self.pickup
        }
    }
}

/// Parse a JSON array of jobs
pub fn jobs_from_json(json: &str) -> crate::core::error::Result<Vec<Job>> {
    Ok(serde_json::from_str(json)?)
}
