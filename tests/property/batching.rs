//! Property-based tests for remote batch sizing

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use erasure::baseline::SledBaselineStore;
use erasure::config::DeletionConfig;
use erasure::coordinator::DeletionCoordinator;
use erasure::local::SledLocalStore;
use erasure::remote::InMemoryRemoteStore;
use erasure::types::{DeletionScope, RecordType};
use proptest::test_runner::{Config, TestRunner};

/// Any record count is deleted in ceil(n / batch_size) requests, none oversized
#[test]
fn test_batch_count_property() {
    let mut runner = TestRunner::new(Config::with_cases(32));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    runner
        .run(&(0usize..1_200, 1usize..=300, 1usize..=250), |(count, batch_size, page_size)| {
            let remote = Arc::new(InMemoryRemoteStore::with_page_size(page_size));
            remote.seed(RecordType::Measurement, "m", count, ts);
            let local = Arc::new(SledLocalStore::temporary().unwrap());
            let baseline = Arc::new(SledBaselineStore::new(local.db()).unwrap());
            let coordinator = DeletionCoordinator::new(remote.clone(), local, baseline)
                .with_settings(DeletionConfig {
                    batch_size,
                    inter_batch_delay_ms: 0,
                    ..DeletionConfig::default()
                });

            let result = runtime
                .block_on(coordinator.delete_all(
                    DeletionScope::AllOfType {
                        record_type: RecordType::Measurement,
                    },
                    None,
                ))
                .unwrap();

            let sizes = remote.delete_sizes();
            assert_eq!(sizes.len(), count.div_ceil(batch_size));
            assert!(sizes.iter().all(|s| *s <= batch_size));
            assert_eq!(sizes.iter().sum::<usize>(), count);
            assert_eq!(result.records_deleted_remote, count as u64);
            assert_eq!(remote.count(RecordType::Measurement), 0);
            Ok(())
        })
        .unwrap();
}
