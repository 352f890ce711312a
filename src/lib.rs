//! Erasure: Coordinated User-Data Deletion
//!
//! Deletes user records from a paginated, rate-limited remote record store and
//! from a local embedded store as one user-visible operation, with ordered
//! progress events, a shared error taxonomy and a reset of derived state.

pub mod baseline;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod local;
pub mod logging;
pub mod progress;
pub mod remote;
pub mod report;
pub mod telemetry;
pub mod translate;
pub mod types;

pub use coordinator::{DeletionCoordinator, PendingConfirmation};
pub use error::DeletionError;
pub use report::DeletionResult;
pub use types::{DeletionScope, Predicate, RecordType};
