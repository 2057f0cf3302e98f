//! Handler-level error type.

use thiserror::Error;

/// Errors returned by node, edge and state-commit handlers.
///
/// The engine never retries; it hands the error back to the caller unchanged.
/// The variant tells the caller whether re-running the step is worthwhile:
/// - `Retryable`: transient, the caller may step the same node again later.
/// - `Fatal`: the instance needs intervention before it can continue.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Transient failure; stepping the same node again may succeed.
    #[error("retryable handler error: {0}")]
    Retryable(String),

    /// Permanent failure.
    #[error("fatal handler error: {0}")]
    Fatal(String),

    /// The handler observed cancellation of the step context.
    #[error("handler cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_) | Self::Cancelled)
    }
}
