//! Native store failures to the shared [`DeletionError`] taxonomy.
//!
//! Both mappings are total: anything unrecognised becomes an opaque
//! `UnderlyingStore` (remote) or `LocalStore` (local) error.

use crate::error::{DeletionError, LocalStoreError, RemoteError, RemoteErrorCode};

pub fn translate_remote(err: &RemoteError) -> DeletionError {
    match &err.code {
        RemoteErrorCode::RequestCancelled => DeletionError::Cancelled,
        RemoteErrorCode::AuthenticationRequired | RemoteErrorCode::AuthenticationFailed => {
            DeletionError::NotAuthenticated
        }
        RemoteErrorCode::AccessDenied | RemoteErrorCode::AccountTemporarilyUnavailable => {
            DeletionError::AccountUnavailable
        }
        RemoteErrorCode::NetworkUnavailable | RemoteErrorCode::NetworkFailure => {
            DeletionError::NetworkUnavailable
        }
        RemoteErrorCode::QuotaExceeded => DeletionError::QuotaExceeded,
        RemoteErrorCode::Throttled
        | RemoteErrorCode::TryAgainLater
        | RemoteErrorCode::ServiceUnavailable => DeletionError::RateLimited {
            retry_after: err.retry_after,
        },
        RemoteErrorCode::ZoneNotFound | RemoteErrorCode::UserDeletedZone => {
            DeletionError::ZoneNotFound
        }
        RemoteErrorCode::UnknownItem | RemoteErrorCode::NotFound => DeletionError::RecordNotFound,
        RemoteErrorCode::BadRequest
        | RemoteErrorCode::Conflict
        | RemoteErrorCode::LimitExceeded
        | RemoteErrorCode::InternalError
        | RemoteErrorCode::Other(_) => DeletionError::UnderlyingStore(err.to_string()),
    }
}

pub fn translate_local(err: &LocalStoreError) -> DeletionError {
    match err {
        LocalStoreError::Interrupted => DeletionError::Cancelled,
        other => DeletionError::LocalStore(other.to_string()),
    }
}

pub fn translate_sled(err: sled::Error) -> LocalStoreError {
    match err {
        sled::Error::Io(io) if io.kind() == std::io::ErrorKind::Interrupted => {
            LocalStoreError::Interrupted
        }
        sled::Error::Io(io) => LocalStoreError::Io(io.to_string()),
        sled::Error::Corruption { at, .. } => {
            LocalStoreError::Corruption(format!("corrupted data at {:?}", at))
        }
        sled::Error::Unsupported(msg) => LocalStoreError::Unsupported(msg),
        sled::Error::ReportableBug(msg) => LocalStoreError::Bug(msg),
        sled::Error::CollectionNotFound(name) => LocalStoreError::Corruption(format!(
            "missing tree {}",
            String::from_utf8_lossy(&name)
        )),
    }
}
