//! Progress observability: sub-range allocation, the event schema, the ordered
//! event bus, and the per-operation tracker that owns `DeletionProgress`.

pub mod bus;
pub mod event;
pub mod range;
pub mod tracker;

pub use bus::ProgressBus;
pub use event::{DeletionProgress, Phase, ProgressEvent, ProgressEventKind};
pub use range::ProgressRange;
pub use tracker::{PhaseProgress, ProgressTracker};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static OPERATION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Current time as milliseconds since Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique operation id.
pub fn new_operation_id() -> String {
    let ts = now_millis();
    let pid = std::process::id();
    let seq = OPERATION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("op-{ts}-{pid}-{seq}")
}
