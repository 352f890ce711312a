//! User confirmation: the gate capability and the two-step begin/commit handle.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::info;

use crate::coordinator::guard::OperationGuard;
use crate::coordinator::DeletionCoordinator;
use crate::error::DeletionError;
use crate::report::DeletionResult;
use crate::types::DeletionScope;

/// Asks whoever started the operation whether to go ahead.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, scope: &DeletionScope) -> bool;
}

/// Gate that always approves; for callers that confirmed out of band.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationGate for AutoConfirm {
    async fn confirm(&self, _scope: &DeletionScope) -> bool {
        true
    }
}

/// Adapts a closure returning a boxed future into a [`ConfirmationGate`].
pub struct FnGate<F>
where
    F: Fn(DeletionScope) -> BoxFuture<'static, bool> + Send + Sync,
{
    f: F,
}

impl<F> FnGate<F>
where
    F: Fn(DeletionScope) -> BoxFuture<'static, bool> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ConfirmationGate for FnGate<F>
where
    F: Fn(DeletionScope) -> BoxFuture<'static, bool> + Send + Sync,
{
    async fn confirm(&self, scope: &DeletionScope) -> bool {
        (self.f)(*scope).await
    }
}

/// An operation that holds the coordinator's slot but has not touched any
/// store yet. Exactly one of [`commit`](Self::commit) or
/// [`cancel`](Self::cancel) should follow; dropping it cancels.
pub struct PendingConfirmation<'a> {
    pub(crate) coordinator: &'a DeletionCoordinator,
    pub(crate) scope: DeletionScope,
    pub(crate) guard: OperationGuard,
}

impl<'a> PendingConfirmation<'a> {
    pub fn scope(&self) -> &DeletionScope {
        &self.scope
    }

    pub fn operation_id(&self) -> &str {
        self.guard.tracker().operation()
    }

    /// Run the operation to completion.
    pub async fn commit(self) -> Result<DeletionResult, DeletionError> {
        self.coordinator.execute(self.scope, self.guard).await
    }

    /// Decline; no store is touched.
    pub fn cancel(self) {
        info!(
            operation = self.guard.tracker().operation(),
            scope = self.scope.name(),
            "deletion declined at confirmation"
        );
        self.guard.abort(&DeletionError::Cancelled);
    }
}
