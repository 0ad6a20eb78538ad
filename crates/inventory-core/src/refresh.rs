//! Refresh generations for stale-result discard.
//!
//! Every refresh takes a `RefreshTicket` from the session's
//! `RefreshCoordinator`. Issuing a newer ticket, or tearing the session down,
//! makes all older tickets stale. Long-running work checks its ticket between
//! batch steps and the session checks it once more before applying results.
//!
//! # Example
//!
//! ```
//! use inventory_core::refresh::RefreshCoordinator;
//!
//! let coordinator = RefreshCoordinator::new();
//! let first = coordinator.issue();
//! let second = coordinator.issue();
//!
//! assert!(first.is_stale());
//! assert!(!second.is_stale());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{InventoryError, Result};

/// Issues refresh tickets and tracks the newest one.
#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    latest: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh generation, superseding every earlier ticket.
    pub fn issue(&self) -> RefreshTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket {
            generation,
            latest: self.latest.clone(),
        }
    }

    /// Invalidate all outstanding tickets without starting a new refresh.
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle held by one refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl RefreshTicket {
    /// Ticket that never goes stale, for one-off synchronous queries.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer refresh (or teardown) has superseded this one.
    pub fn is_stale(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    /// Return `Cancelled` if this ticket is stale.
    pub fn check(&self) -> Result<()> {
        if self.is_stale() {
            Err(InventoryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of an offloaded refresh.
#[derive(Debug)]
pub enum RefreshOutcome<T> {
    /// Results of the newest refresh.
    Fetched(T),
    /// Superseded before completion; results were discarded.
    Stale,
}

impl<T> RefreshOutcome<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, RefreshOutcome::Stale)
    }

    pub fn fetched(self) -> Option<T> {
        match self {
            RefreshOutcome::Fetched(value) => Some(value),
            RefreshOutcome::Stale => None,
        }
    }
}
