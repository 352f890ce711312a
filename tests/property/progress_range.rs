//! Property-based tests for progress sub-range mapping and allocation

use erasure::coordinator::PhasePlan;
use erasure::progress::ProgressRange;
use erasure::types::{DeletionScope, RecordType};
use proptest::prelude::*;

/// Mapped progress never leaves the range, whatever the input
#[test]
fn test_map_stays_within_range_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(0.0f64..=1.0, 0.0f64..=1.0, -2.0f64..3.0),
            |(a, b, p)| {
                let range = ProgressRange::new(a, b);
                let mapped = range.map(p);
                assert!(range.contains(mapped), "{} not in {:?}", mapped, range);
                Ok(())
            },
        )
        .unwrap();
}

/// Mapping preserves order, so monotonic phase progress stays monotonic overall
#[test]
fn test_map_is_monotonic_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
            |(a, b, p, q)| {
                let range = ProgressRange::new(a, b);
                let (low, high) = if p <= q { (p, q) } else { (q, p) };
                assert!(range.map(low) <= range.map(high));
                Ok(())
            },
        )
        .unwrap();
}

/// Split sub-ranges tile the parent with no gaps or overlaps
#[test]
fn test_split_is_contiguous_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                0.0f64..=1.0,
                0.0f64..=1.0,
                prop::collection::vec(0.0f64..20.0, 1..8),
            ),
            |(a, b, weights)| {
                let range = ProgressRange::new(a, b);
                let parts = range.split(&weights);

                assert_eq!(parts.len(), weights.len());
                assert!((parts[0].lo() - range.lo()).abs() < 1e-12);
                assert_eq!(parts.last().unwrap().hi(), range.hi());
                for pair in parts.windows(2) {
                    assert!((pair[0].hi() - pair[1].lo()).abs() < 1e-12);
                    assert!(pair[0].lo() <= pair[0].hi());
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Every scope's plan covers [0, 1] end to end, in phase order
#[test]
fn test_phase_plan_covers_unit_interval_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let record_type = prop_oneof![
        Just(RecordType::Measurement),
        Just(RecordType::Baseline),
        Just(RecordType::SyncMetadata),
    ];
    let scope = prop_oneof![
        record_type.prop_map(|record_type| DeletionScope::AllOfType { record_type }),
        Just(DeletionScope::AllTypes),
        Just(DeletionScope::RemoteOnlyReset),
        Just(DeletionScope::FactoryReset),
    ];

    runner
        .run(&scope, |scope| {
            let plan = PhasePlan::for_scope(&scope);
            let mut ranges: Vec<ProgressRange> = plan.remote.iter().map(|(_, r)| *r).collect();
            ranges.extend(plan.local.iter().map(|(_, r)| *r));
            ranges.extend(plan.baseline);

            assert_eq!(ranges[0].lo(), 0.0);
            assert_eq!(ranges.last().unwrap().hi(), 1.0);
            for pair in ranges.windows(2) {
                assert!((pair[0].hi() - pair[1].lo()).abs() < 1e-12);
            }
            Ok(())
        })
        .unwrap();
}
