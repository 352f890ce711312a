//! What subscribers observe while an operation runs.

use std::sync::Arc;

use erasure::progress::{Phase, ProgressEvent, ProgressEventKind};
use erasure::remote::InMemoryRemoteStore;
use erasure::types::{DeletionScope, RecordType};

use super::test_utils::{day, fast_settings, Harness};

fn seeded_harness() -> Harness {
    let h = Harness::build(Arc::new(InMemoryRemoteStore::with_page_size(100)), fast_settings());
    h.remote.seed(RecordType::Measurement, "m", 650, day(1));
    h.remote.seed(RecordType::Baseline, "b", 40, day(1));
    h.local.seed(RecordType::Measurement, "m", 300, day(1)).unwrap();
    h.local.seed(RecordType::SyncMetadata, "s", 12, day(1)).unwrap();
    h
}

fn ranges(events: &[ProgressEvent]) -> Vec<(Phase, Option<RecordType>, f64, f64)> {
    events
        .iter()
        .filter_map(|e| match &e.kind {
            ProgressEventKind::PhaseStarted {
                phase,
                record_type,
                lo,
                hi,
                ..
            } => Some((*phase, *record_type, *lo, *hi)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn events_are_ordered_contiguous_and_monotonic() {
    let h = seeded_harness();
    let rx = h.coordinator.subscribe();
    h.coordinator.factory_reset(None).await.unwrap();
    let events: Vec<ProgressEvent> = rx.try_iter().collect();

    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=events.len() as u64).collect::<Vec<_>>());
    assert!(events.iter().all(|e| e.operation == events[0].operation));

    let fractions: Vec<f64> = events.iter().filter_map(|e| e.fraction()).collect();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|w| w[1] >= w[0]));
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));

    assert_eq!(events[0].kind.name(), "awaiting_confirmation");
    assert_eq!(events[1].kind.name(), "operation_started");
    let last = events.last().unwrap();
    assert!(matches!(
        last.kind,
        ProgressEventKind::OperationCompleted {
            records_deleted_remote: 690,
            records_deleted_local: 312,
            issues: 0,
        }
    ));
    assert_eq!(events.iter().filter(|e| e.kind.is_terminal()).count(), 1);
}

#[tokio::test]
async fn every_progress_event_stays_inside_its_phase_range() {
    let h = seeded_harness();
    let rx = h.coordinator.subscribe();
    h.coordinator.factory_reset(None).await.unwrap();
    let events: Vec<ProgressEvent> = rx.try_iter().collect();

    let mut current: Option<(f64, f64)> = None;
    for event in &events {
        match &event.kind {
            ProgressEventKind::PhaseStarted { lo, hi, .. } => current = Some((*lo, *hi)),
            ProgressEventKind::Progress { fraction, .. } => {
                let (lo, hi) = current.expect("progress outside a phase");
                assert!(
                    *fraction >= lo - 1e-9 && *fraction <= hi + 1e-9,
                    "{} outside [{}, {}]",
                    fraction,
                    lo,
                    hi
                );
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn factory_reset_allocates_half_to_remote_and_a_tenth_to_baseline() {
    let h = seeded_harness();
    let rx = h.coordinator.subscribe();
    h.coordinator.factory_reset(None).await.unwrap();
    let phases = ranges(&rx.try_iter().collect::<Vec<_>>());

    let remote: Vec<_> = phases.iter().filter(|p| p.0 == Phase::Remote).collect();
    let local: Vec<_> = phases.iter().filter(|p| p.0 == Phase::Local).collect();
    let baseline: Vec<_> = phases
        .iter()
        .filter(|p| p.0 == Phase::BaselineReset)
        .collect();

    assert_eq!(remote.len(), 3);
    assert_eq!(local.len(), 3);
    assert_eq!(baseline.len(), 1);
    assert!((remote[0].2 - 0.0).abs() < 1e-9);
    assert!((remote[2].3 - 0.5).abs() < 1e-9);
    assert!((local[0].2 - 0.5).abs() < 1e-9);
    assert!((local[2].3 - 0.9).abs() < 1e-9);
    assert!((baseline[0].2 - 0.9).abs() < 1e-9);
    assert!((baseline[0].3 - 1.0).abs() < 1e-9);
    // Measurements carry the largest share of each phase.
    assert!(remote[0].3 - remote[0].2 > remote[1].3 - remote[1].2);
}

#[tokio::test]
async fn single_type_scope_uses_the_standard_split() {
    let h = seeded_harness();
    let rx = h.coordinator.subscribe();
    h.coordinator
        .delete_all(
            DeletionScope::AllOfType {
                record_type: RecordType::Measurement,
            },
            None,
        )
        .await
        .unwrap();
    let phases = ranges(&rx.try_iter().collect::<Vec<_>>());
    let expected = [
        (Phase::Remote, Some(RecordType::Measurement), 0.0, 0.6),
        (Phase::Local, Some(RecordType::Measurement), 0.6, 0.95),
        (Phase::BaselineReset, None, 0.95, 1.0),
    ];
    assert_eq!(phases.len(), expected.len());
    for (got, want) in phases.iter().zip(expected.iter()) {
        assert_eq!((got.0, got.1), (want.0, want.1));
        assert!((got.2 - want.2).abs() < 1e-9 && (got.3 - want.3).abs() < 1e-9);
    }
}

#[tokio::test]
async fn remote_only_reset_spends_the_whole_range_remotely() {
    let h = seeded_harness();
    let rx = h.coordinator.subscribe();
    h.coordinator.reset_remote(None).await.unwrap();
    let phases = ranges(&rx.try_iter().collect::<Vec<_>>());
    assert!(phases.iter().all(|p| p.0 == Phase::Remote));
    assert!((phases.last().unwrap().3 - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn local_phase_reports_in_tenths_before_commit() {
    let h = Harness::new();
    h.local.seed(RecordType::Measurement, "m", 1000, day(1)).unwrap();
    let rx = h.coordinator.subscribe();
    h.coordinator
        .delete_all(
            DeletionScope::AllOfType {
                record_type: RecordType::Measurement,
            },
            None,
        )
        .await
        .unwrap();

    let local_fractions: Vec<f64> = rx
        .try_iter()
        .filter_map(|e| match e.kind {
            ProgressEventKind::Progress {
                phase: Phase::Local,
                fraction,
                ..
            } => Some(fraction),
            _ => None,
        })
        .collect();
    // phase start, ten marking steps, commit
    assert_eq!(local_fractions.len(), 12);
    let before_commit = local_fractions[local_fractions.len() - 2];
    assert!((before_commit - (0.6 + 0.35 * 0.9)).abs() < 1e-9);
    assert!((local_fractions.last().unwrap() - 0.95).abs() < 1e-9);
}

#[tokio::test]
async fn snapshot_is_reset_after_completion_of_a_failed_run() {
    use erasure::error::{RemoteError, RemoteErrorCode};
    let h = seeded_harness();
    h.remote.fail_next_query(RemoteError::new(
        RemoteErrorCode::NetworkFailure,
        "connection reset",
    ));
    h.coordinator.factory_reset(None).await.unwrap_err();
    let snapshot = h.coordinator.progress();
    assert!(!snapshot.in_progress);
    assert_eq!(snapshot.fraction, 0.0);
    assert_eq!(snapshot.records_deleted, 0);
}
