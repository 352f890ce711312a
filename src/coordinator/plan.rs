//! Phase sequencing and progress sub-range allocation per scope.

use crate::progress::ProgressRange;
use crate::types::{DeletionScope, RecordType};

/// Ordered phases of one operation with the slice of `[0, 1]` each owns.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    pub remote: Vec<(RecordType, ProgressRange)>,
    pub local: Vec<(RecordType, ProgressRange)>,
    pub baseline: Option<ProgressRange>,
}

impl PhasePlan {
    pub fn for_scope(scope: &DeletionScope) -> Self {
        let types = scope.record_types();
        let (remote, local, baseline) = match scope {
            DeletionScope::RemoteOnlyReset => (ProgressRange::FULL, None, None),
            DeletionScope::FactoryReset => (
                ProgressRange::new(0.0, 0.5),
                Some(ProgressRange::new(0.5, 0.9)),
                Some(ProgressRange::new(0.9, 1.0)),
            ),
            _ => (
                ProgressRange::new(0.0, 0.6),
                Some(ProgressRange::new(0.6, 0.95)),
                Some(ProgressRange::new(0.95, 1.0)),
            ),
        };

        Self {
            remote: allocate(&types, remote),
            local: local.map(|r| allocate(&types, r)).unwrap_or_default(),
            baseline,
        }
    }
}

fn allocate(types: &[RecordType], range: ProgressRange) -> Vec<(RecordType, ProgressRange)> {
    let weights: Vec<f64> = types.iter().map(|t| t.progress_weight()).collect();
    types.iter().copied().zip(range.split(&weights)).collect()
}
