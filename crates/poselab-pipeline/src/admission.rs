//! Admission control for concurrently running pipelines.
//!
//! # Design
//! - A counted semaphore owned by the pipeline service, not ambient state.
//! - `try_admit` never blocks; callers reject excess requests immediately.
//! - Slots release on drop so every exit path gives the permit back.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of pipelines running at once.
#[derive(Clone)]
pub struct AdmissionController {
    permits: Arc<Semaphore>,
    limit: usize,
}

/// Permission to run one pipeline; the slot frees on drop.
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionController {
    /// Create a controller with the given ceiling.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Attempt to claim a slot without waiting.
    ///
    /// Returns `None` when the ceiling is reached; the caller must reject
    /// the request rather than queue it.
    #[must_use]
    pub fn try_admit(&self) -> Option<AdmissionSlot> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionSlot { _permit: permit })
    }

    /// Configured ceiling on concurrent pipelines.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_ceiling_and_rejects_excess() {
        let controller = AdmissionController::new(2);
        let first = controller.try_admit();
        let second = controller.try_admit();
        assert!(first.is_some());
        assert!(second.is_some());
        assert!(controller.try_admit().is_none());
        assert_eq!(controller.available(), 0);
    }

    #[test]
    fn dropped_slot_becomes_available_again() {
        let controller = AdmissionController::new(1);
        let slot = controller.try_admit();
        assert!(slot.is_some());
        assert!(controller.try_admit().is_none());
        drop(slot);
        assert!(controller.try_admit().is_some());
    }

    #[test]
    fn available_never_exceeds_limit() {
        let controller = AdmissionController::new(3);
        let slot = controller.try_admit();
        drop(slot);
        assert_eq!(controller.available(), controller.limit());
    }
}
