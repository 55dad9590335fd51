//! A courier's accepted jobs
//!
//! Weight capacity is enforced on accept. Pick-up and delivery only
//! succeed on the matching tile.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::{CourierError, Result};
use crate::core::types::{JobId, Position};
use crate::jobs::Job;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    max_weight: f32,
    jobs: Vec<Job>,
}

impl Inventory {
    pub fn new(max_weight: f32) -> Self {
        Self {
            max_weight,
            jobs: Vec::new(),
        }
    }

    pub fn max_weight(&self) -> f32 {
        self.max_weight
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Weight of every accepted job, picked up or not
    pub fn total_weight(&self) -> f32 {
        self.jobs.iter().map(|job| job.weight).sum()
    }

    /// Weight actually on the courier's back
    pub fn carried_weight(&self) -> f32 {
        self.jobs
            .iter()
            .filter(|job| job.is_picked_up())
            .map(|job| job.weight)
            .sum()
    }

    /// Accept a job if it fits under the weight cap
    pub fn accept(&mut self, job: Job) -> Result<()> {
        let total = self.total_weight() + job.weight;
        if total > self.max_weight {
            return Err(CourierError::OverCapacity {
                id: job.id,
                total,
                max: self.max_weight,
            });
        }
        self.jobs.push(job);
        Ok(())
    }

    /// Pick up a job when standing on its pickup tile
    pub fn pick_up(&mut self, id: &JobId, at: Position) -> Result<bool> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| &job.id == id)
            .ok_or_else(|| CourierError::UnknownJob(id.clone()))?;
        if job.picked_up || job.pickup != at {
            return Ok(false);
        }
        job.picked_up = true;
        Ok(true)
    }

    /// Deliver a picked-up job on its dropoff tile, returning the payout
    pub fn deliver(&mut self, id: &JobId, at: Position) -> Option<f32> {
        let index = self
            .jobs
            .iter()
            .position(|job| &job.id == id && job.picked_up && job.dropoff == at)?;
        Some(self.jobs.remove(index).payout)
    }

    pub fn remove(&mut self, id: &JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|job| &job.id == id)?;
        Some(self.jobs.remove(index))
    }

    /// Drop every job whose deadline is at or before `elapsed_secs`
    pub fn expire_due(&mut self, elapsed_secs: f32) -> Vec<Job> {
        let (expired, kept): (Vec<Job>, Vec<Job>) = std::mem::take(&mut self.jobs)
            .into_iter()
            .partition(|job| job.deadline.is_some_and(|deadline| deadline <= elapsed_secs));
        self.jobs = kept;
        for job in &expired {
            tracing::debug!(
                "Job {} expired at {:.1}s (deadline {:.1}s)",
                job.id,
                elapsed_secs,
                job.deadline.unwrap_or_default()
            );
        }
        expired
    }

    /// Highest priority first; equal priorities keep acceptance order
    pub fn by_priority(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.iter().collect();
        jobs.sort_by(|a, b| b.priority.cmp(&a.priority));
        jobs
    }

    /// Earliest deadline first; jobs without a deadline go last
    pub fn by_deadline(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.iter().collect();
        jobs.sort_by(|a, b| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        jobs
    }
}
