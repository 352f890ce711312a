//! Cooperative cancellation flag checked at every suspension point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DeletionError;

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the flag is raised.
    pub fn check(&self) -> Result<(), DeletionError> {
        if self.is_cancelled() {
            Err(DeletionError::Cancelled)
        } else {
            Ok(())
        }
    }
}
