//! Jobs waiting to be released and jobs currently on offer

use serde::{Deserialize, Serialize};

use crate::core::types::JobId;
use crate::jobs::Job;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBoard {
    pending: Vec<Job>,
    visible: Vec<Job>,
}

impl JobBoard {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            pending: jobs,
            visible: Vec::new(),
        }
    }

    /// Jobs currently offered to couriers
    pub fn visible(&self) -> &[Job] {
        &self.visible
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Offer every job whose release time has passed; returns how many
    pub fn release_due(&mut self, elapsed_secs: f32) -> usize {
        let (due, waiting): (Vec<Job>, Vec<Job>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|job| job.release_time <= elapsed_secs);
        self.pending = waiting;
        let released = due.len();
        self.visible.extend(due);
        released
    }

    /// Remove an offered job so it can be accepted
    pub fn take(&mut self, id: &JobId) -> Option<Job> {
        let index = self.visible.iter().position(|job| &job.id == id)?;
        Some(self.visible.remove(index))
    }

    /// Put a job back on offer, e.g. after a rejected accept
    pub fn restore(&mut self, job: Job) {
        self.visible.push(job);
    }
}
