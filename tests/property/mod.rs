//! Property-based tests for progress allocation, remote batching and
//! timestamp-filtered deletion

mod batching;
mod predicate_deletion;
mod progress_range;
