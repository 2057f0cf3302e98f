//! Handler traits: the contract every piece of approval logic must fulfil.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::record::{EdgeRecord, NodeRecord};
use crate::HandlerError;

/// Per-step context handed unchanged to every handler call.
///
/// Defined here (in the handlers crate) so both the engine and individual
/// handler implementations can import it without a circular dependency.
/// The engine never inspects it, cancellation included.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Process instance being advanced.
    pub instance_id: Uuid,
    /// Caller-supplied payload for this step (form data, approver, ...).
    pub input: Value,
    /// Cancellation signal; honouring it is up to each handler.
    pub cancel: CancellationToken,
}

impl StepContext {
    pub fn new(instance_id: Uuid, input: Value) -> Self {
        Self {
            instance_id,
            input,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Node business logic. One trait serves the on-, before- and after-handler
/// slots of the registry; the slot decides when it runs.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn handle(&self, node: &dyn NodeRecord, ctx: &StepContext) -> Result<(), HandlerError>;
}

/// Decides whether an edge is taken. `Ok(false)` is not an error: the
/// engine moves on to the next edge.
#[async_trait]
pub trait EdgeHandler: Send + Sync {
    async fn decide(&self, edge: &dyn EdgeRecord, ctx: &StepContext) -> Result<bool, HandlerError>;
}

/// Persists an accepted transition. Called at most once per step, after the
/// source node's after-handler and before the destination's before-handler.
#[async_trait]
pub trait StateCommit: Send + Sync {
    async fn commit(&self, edge: &dyn EdgeRecord, ctx: &StepContext) -> Result<(), HandlerError>;
}

// ---------------------------------------------------------------------------
// Shared handlers
// ---------------------------------------------------------------------------

#[async_trait]
impl<T: NodeHandler + ?Sized> NodeHandler for Arc<T> {
    async fn handle(&self, node: &dyn NodeRecord, ctx: &StepContext) -> Result<(), HandlerError> {
        (**self).handle(node, ctx).await
    }
}

#[async_trait]
impl<T: EdgeHandler + ?Sized> EdgeHandler for Arc<T> {
    async fn decide(&self, edge: &dyn EdgeRecord, ctx: &StepContext) -> Result<bool, HandlerError> {
        (**self).decide(edge, ctx).await
    }
}

#[async_trait]
impl<T: StateCommit + ?Sized> StateCommit for Arc<T> {
    async fn commit(&self, edge: &dyn EdgeRecord, ctx: &StepContext) -> Result<(), HandlerError> {
        (**self).commit(edge, ctx).await
    }
}
