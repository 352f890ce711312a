//! Property-based tests for timestamp-filtered local deletion

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use erasure::baseline::SledBaselineStore;
use erasure::config::DeletionConfig;
use erasure::coordinator::DeletionCoordinator;
use erasure::local::{LocalEntity, SledLocalStore};
use erasure::remote::InMemoryRemoteStore;
use erasure::types::RecordType;
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};

/// Deleting before a cutoff leaves exactly the entities at or after it
#[test]
fn test_delete_before_partitions_by_cutoff_property() {
    let mut runner = TestRunner::new(Config::with_cases(48));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    // Seconds around the epoch so negative timestamps are covered too.
    let seconds = -200_000_000i64..2_000_000_000i64;
    runner
        .run(
            &(prop::collection::vec(seconds.clone(), 0..60), seconds),
            |(stamps, cutoff)| {
                let local = Arc::new(SledLocalStore::temporary().unwrap());
                for (n, secs) in stamps.iter().enumerate() {
                    let ts = Utc.timestamp_opt(*secs, 0).unwrap();
                    local
                        .insert(RecordType::Measurement, &LocalEntity::new(format!("e{n}"), ts, vec![]))
                        .unwrap();
                }
                let baseline = Arc::new(SledBaselineStore::new(local.db()).unwrap());
                let coordinator = DeletionCoordinator::new(
                    Arc::new(InMemoryRemoteStore::new()),
                    local.clone(),
                    baseline,
                )
                .with_settings(DeletionConfig {
                    inter_batch_delay_ms: 0,
                    ..DeletionConfig::default()
                });
                let cutoff = Utc.timestamp_opt(cutoff, 0).unwrap();

                let result = runtime
                    .block_on(coordinator.delete_before(RecordType::Measurement, cutoff, None))
                    .unwrap();

                let expected_deleted = stamps.iter().filter(|s| **s < cutoff.timestamp()).count();
                assert_eq!(result.records_deleted_local, expected_deleted as u64);
                let remaining = local.entities(RecordType::Measurement).unwrap();
                assert_eq!(remaining.len(), stamps.len() - expected_deleted);
                assert!(remaining.iter().all(|e| e.timestamp() >= cutoff));
                Ok(())
            },
        )
        .unwrap();
}
