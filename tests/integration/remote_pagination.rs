//! Remote sweep behavior: cursors, deduplication and the pagination cap.

use erasure::config::DeletionConfig;
use erasure::error::{DeletionError, RemoteError, RemoteErrorCode};
use erasure::remote::memory::RemoteCall;
use erasure::remote::{DesiredKeys, InMemoryRemoteStore};
use erasure::report::IssueStage;
use erasure::types::{DeletionScope, RecordType};
use std::sync::Arc;

use super::test_utils::{day, fast_settings, Harness};

fn measurement_scope() -> DeletionScope {
    DeletionScope::AllOfType {
        record_type: RecordType::Measurement,
    }
}

#[tokio::test]
async fn continuation_pages_request_identifiers_only() {
    let h = Harness::build(Arc::new(InMemoryRemoteStore::with_page_size(50)), fast_settings());
    h.remote.seed(RecordType::Measurement, "m", 120, day(1));

    let result = h.coordinator.delete_all(measurement_scope(), None).await.unwrap();
    assert_eq!(result.records_deleted_remote, 120);

    let calls = h.remote.calls();
    assert!(matches!(
        calls[0],
        RemoteCall::Query {
            desired_keys: DesiredKeys::Full,
            ..
        }
    ));
    let continuations: Vec<&RemoteCall> = calls
        .iter()
        .filter(|c| matches!(c, RemoteCall::Continue { .. }))
        .collect();
    assert_eq!(continuations.len(), 2);
    assert!(continuations.iter().all(|c| matches!(
        c,
        RemoteCall::Continue {
            desired_keys: DesiredKeys::IdentifiersOnly,
            ..
        }
    )));
}

#[tokio::test]
async fn endless_cursor_stops_at_cap_and_reports_truncation() {
    let settings = DeletionConfig {
        pagination_cap: 1_000,
        ..fast_settings()
    };
    let h = Harness::build(Arc::new(InMemoryRemoteStore::with_page_size(200)), settings);
    h.remote.seed(RecordType::Measurement, "m", 200, day(1));
    h.remote.set_endless(true);

    let result = h.coordinator.delete_all(measurement_scope(), None).await.unwrap();

    assert_eq!(result.truncated, vec![RecordType::Measurement]);
    assert!(!result.is_clean());
    assert_eq!(result.records_deleted_remote, 1_000);
    let continuations = h
        .remote
        .calls()
        .iter()
        .filter(|c| matches!(c, RemoteCall::Continue { .. }))
        .count();
    assert_eq!(continuations, 4);
}

#[tokio::test(start_paused = true)]
async fn default_cap_collects_exactly_ten_thousand_identifiers() {
    let settings = DeletionConfig::default();
    assert_eq!(settings.pagination_cap, 10_000);
    let h = Harness::build(Arc::new(InMemoryRemoteStore::new()), settings);
    h.remote.seed(RecordType::Measurement, "m", 200, day(1));
    h.remote.set_endless(true);

    let result = h.coordinator.delete_all(measurement_scope(), None).await.unwrap();

    assert_eq!(result.truncated, vec![RecordType::Measurement]);
    assert_eq!(result.records_deleted_remote, 10_000);
    let sizes = h.remote.delete_sizes();
    assert_eq!(sizes.iter().sum::<usize>(), 10_000);
    assert_eq!(sizes.len(), 34);
    assert!(sizes.iter().all(|size| *size <= 300));
    assert_eq!(h.remote.count(RecordType::Measurement), 0);
}

#[tokio::test]
async fn failing_continuation_keeps_what_was_collected() {
    let h = Harness::build(Arc::new(InMemoryRemoteStore::with_page_size(100)), fast_settings());
    h.remote.seed(RecordType::Measurement, "m", 250, day(1));
    h.remote.fail_next_continuation(RemoteError::new(
        RemoteErrorCode::ServiceUnavailable,
        "try later",
    ));

    let result = h.coordinator.delete_all(measurement_scope(), None).await.unwrap();

    assert_eq!(result.records_deleted_remote, 100);
    assert_eq!(h.remote.count(RecordType::Measurement), 150);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].stage, IssueStage::Page { page: 1 });
    assert!(matches!(result.errors[0].error, DeletionError::RateLimited { .. }));
}

#[tokio::test]
async fn failed_initial_query_skips_only_that_type() {
    let h = Harness::new();
    h.remote.seed(RecordType::Measurement, "m", 10, day(1));
    h.remote.seed(RecordType::Baseline, "b", 10, day(1));
    h.remote
        .fail_next_query(RemoteError::new(RemoteErrorCode::ZoneNotFound, "no zone"));

    let result = h
        .coordinator
        .delete_all(DeletionScope::RemoteOnlyReset, None)
        .await
        .unwrap();

    // Measurement is queried first and fails; the others proceed.
    assert_eq!(h.remote.count(RecordType::Measurement), 10);
    assert_eq!(h.remote.count(RecordType::Baseline), 0);
    assert_eq!(result.records_deleted_remote, 10);
    assert_eq!(result.errors[0].stage, IssueStage::Query);
    assert_eq!(result.errors[0].error, DeletionError::ZoneNotFound);
}

#[tokio::test]
async fn network_loss_mid_sweep_aborts() {
    let h = Harness::build(Arc::new(InMemoryRemoteStore::with_page_size(100)), fast_settings());
    h.remote.seed(RecordType::Measurement, "m", 250, day(1));
    h.remote.fail_next_continuation(RemoteError::new(
        RemoteErrorCode::NetworkUnavailable,
        "offline",
    ));

    let err = h
        .coordinator
        .delete_all(measurement_scope(), None)
        .await
        .unwrap_err();
    assert_eq!(err, DeletionError::NetworkUnavailable);
    assert_eq!(h.remote.count(RecordType::Measurement), 250);
    assert!(h.remote.delete_sizes().is_empty());
}
