//! Delivery jobs and the bookkeeping around them
//!
//! The decision engine reads jobs through [`JobView`] and never mutates
//! them. Accepting, picking up and delivering are the caller's business.

pub mod board;
pub mod inventory;
pub mod job;

pub use board::JobBoard;
pub use inventory::Inventory;
pub use job::Job;

/// Read-only view over a courier's jobs and the jobs on offer
pub trait JobView {
    /// Jobs the courier has accepted, picked up or not
    fn accepted_jobs(&self) -> &[Job];

    /// Jobs the world currently offers
    fn offered_jobs(&self) -> &[Job] {
        &[]
    }

    /// Accepted jobs already picked up
    fn picked_jobs(&self) -> Vec<&Job> {
        self.accepted_jobs()
            .iter()
            .filter(|job| job.is_picked_up())
            .collect()
    }

    /// Accepted jobs still waiting at their pickup tile
    fn pending_pickups(&self) -> Vec<&Job> {
        self.accepted_jobs()
            .iter()
            .filter(|job| !job.is_picked_up())
            .collect()
    }

    fn has_active_jobs(&self) -> bool {
        !self.accepted_jobs().is_empty()
    }
}

impl JobView for [Job] {
    fn accepted_jobs(&self) -> &[Job] {
        self
    }
}

impl JobView for Vec<Job> {
    fn accepted_jobs(&self) -> &[Job] {
        self
    }
}

/// A courier's inventory paired with the public job board
#[derive(Debug, Clone, Copy)]
pub struct JobLedger<'a> {
    pub inventory: &'a Inventory,
    pub board: &'a JobBoard,
}

impl<'a> JobLedger<'a> {
    pub fn new(inventory: &'a Inventory, board: &'a JobBoard) -> Self {
        Self { inventory, board }
    }
}

impl JobView for JobLedger<'_> {
    fn accepted_jobs(&self) -> &[Job] {
        self.inventory.jobs()
    }

    fn offered_jobs(&self) -> &[Job] {
        self.board.visible()
    }
}
