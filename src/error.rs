//! Error types for the coordinated deletion engine.
//!
//! `DeletionError` is the one vocabulary callers reason about. `RemoteError` and
//! `LocalStoreError` are the native vocabularies of the two stores; they are
//! folded into `DeletionError` by [`crate::translate`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Shared failure taxonomy returned by every public deletion operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeletionError {
    #[error("Deletion cancelled")]
    Cancelled,

    #[error("Not authenticated with the remote store")]
    NotAuthenticated,

    #[error("Remote account unavailable")]
    AccountUnavailable,

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Remote storage quota exceeded")]
    QuotaExceeded,

    #[error("Rate limited by the remote store{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Remote zone not found")]
    ZoneNotFound,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("Remote store error: {0}")]
    UnderlyingStore(String),

    #[error("A deletion operation is already in progress")]
    OperationInProgress,

    #[error("Invalid deletion scope: {0}")]
    InvalidScope(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}ms)", d.as_millis()),
        None => String::new(),
    }
}

impl DeletionError {
    /// Remote failures after which no further batch can succeed.
    pub fn aborts_remote_phase(&self) -> bool {
        matches!(
            self,
            DeletionError::NotAuthenticated
                | DeletionError::NetworkUnavailable
                | DeletionError::Cancelled
        )
    }

    /// Stable snake_case code for events and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            DeletionError::Cancelled => "cancelled",
            DeletionError::NotAuthenticated => "not_authenticated",
            DeletionError::AccountUnavailable => "account_unavailable",
            DeletionError::NetworkUnavailable => "network_unavailable",
            DeletionError::QuotaExceeded => "quota_exceeded",
            DeletionError::RateLimited { .. } => "rate_limited",
            DeletionError::ZoneNotFound => "zone_not_found",
            DeletionError::RecordNotFound => "record_not_found",
            DeletionError::LocalStore(_) => "local_store_error",
            DeletionError::UnderlyingStore(_) => "underlying_store_error",
            DeletionError::OperationInProgress => "operation_in_progress",
            DeletionError::InvalidScope(_) => "invalid_scope",
            DeletionError::Config(_) => "config_error",
        }
    }
}

impl From<config::ConfigError> for DeletionError {
    fn from(err: config::ConfigError) -> Self {
        DeletionError::Config(err.to_string())
    }
}

impl From<LocalStoreError> for DeletionError {
    fn from(err: LocalStoreError) -> Self {
        crate::translate::translate_local(&err)
    }
}

impl From<RemoteError> for DeletionError {
    fn from(err: RemoteError) -> Self {
        crate::translate::translate_remote(&err)
    }
}

/// Failure codes spoken by the remote record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorCode {
    RequestCancelled,
    AuthenticationRequired,
    AuthenticationFailed,
    AccessDenied,
    AccountTemporarilyUnavailable,
    NetworkUnavailable,
    NetworkFailure,
    QuotaExceeded,
    Throttled,
    TryAgainLater,
    ServiceUnavailable,
    ZoneNotFound,
    UserDeletedZone,
    UnknownItem,
    NotFound,
    BadRequest,
    Conflict,
    LimitExceeded,
    InternalError,
    Other(String),
}

impl RemoteErrorCode {
    /// Parse a `serverErrorCode` value from a store response.
    pub fn from_server_code(code: &str) -> Self {
        match code {
            "REQUEST_CANCELLED" => RemoteErrorCode::RequestCancelled,
            "AUTHENTICATION_REQUIRED" => RemoteErrorCode::AuthenticationRequired,
            "AUTHENTICATION_FAILED" => RemoteErrorCode::AuthenticationFailed,
            "ACCESS_DENIED" => RemoteErrorCode::AccessDenied,
            "ACCOUNT_TEMPORARILY_UNAVAILABLE" => RemoteErrorCode::AccountTemporarilyUnavailable,
            "QUOTA_EXCEEDED" => RemoteErrorCode::QuotaExceeded,
            "THROTTLED" => RemoteErrorCode::Throttled,
            "TRY_AGAIN_LATER" => RemoteErrorCode::TryAgainLater,
            "SERVICE_UNAVAILABLE" => RemoteErrorCode::ServiceUnavailable,
            "ZONE_NOT_FOUND" => RemoteErrorCode::ZoneNotFound,
            "USER_DELETED_ZONE" => RemoteErrorCode::UserDeletedZone,
            "UNKNOWN_ITEM" => RemoteErrorCode::UnknownItem,
            "NOT_FOUND" => RemoteErrorCode::NotFound,
            "BAD_REQUEST" => RemoteErrorCode::BadRequest,
            "CONFLICT" => RemoteErrorCode::Conflict,
            "LIMIT_EXCEEDED" => RemoteErrorCode::LimitExceeded,
            "INTERNAL_ERROR" => RemoteErrorCode::InternalError,
            other => RemoteErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteErrorCode::RequestCancelled => "REQUEST_CANCELLED",
            RemoteErrorCode::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            RemoteErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            RemoteErrorCode::AccessDenied => "ACCESS_DENIED",
            RemoteErrorCode::AccountTemporarilyUnavailable => "ACCOUNT_TEMPORARILY_UNAVAILABLE",
            RemoteErrorCode::NetworkUnavailable => "NETWORK_UNAVAILABLE",
            RemoteErrorCode::NetworkFailure => "NETWORK_FAILURE",
            RemoteErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            RemoteErrorCode::Throttled => "THROTTLED",
            RemoteErrorCode::TryAgainLater => "TRY_AGAIN_LATER",
            RemoteErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            RemoteErrorCode::ZoneNotFound => "ZONE_NOT_FOUND",
            RemoteErrorCode::UserDeletedZone => "USER_DELETED_ZONE",
            RemoteErrorCode::UnknownItem => "UNKNOWN_ITEM",
            RemoteErrorCode::NotFound => "NOT_FOUND",
            RemoteErrorCode::BadRequest => "BAD_REQUEST",
            RemoteErrorCode::Conflict => "CONFLICT",
            RemoteErrorCode::LimitExceeded => "LIMIT_EXCEEDED",
            RemoteErrorCode::InternalError => "INTERNAL_ERROR",
            RemoteErrorCode::Other(code) => code.as_str(),
        }
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native remote store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: RemoteErrorCode,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl RemoteError {
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

/// Native local store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalStoreError {
    #[error("Local store I/O error: {0}")]
    Io(String),

    #[error("Local store corruption: {0}")]
    Corruption(String),

    #[error("Failed to encode or decode entity: {0}")]
    Codec(String),

    #[error("Unsupported local store operation: {0}")]
    Unsupported(String),

    #[error("Local store bug: {0}")]
    Bug(String),

    #[error("Local store operation interrupted")]
    Interrupted,
}

impl From<sled::Error> for LocalStoreError {
    fn from(err: sled::Error) -> Self {
        crate::translate::translate_sled(err)
    }
}

impl From<bincode::Error> for LocalStoreError {
    fn from(err: bincode::Error) -> Self {
        LocalStoreError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for LocalStoreError {
    fn from(err: serde_json::Error) -> Self {
        LocalStoreError::Codec(err.to_string())
    }
}
