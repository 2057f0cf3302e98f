//! Recording test doubles for every handler kind.
//!
//! All doubles built from the same [`Journal`] append to one ordered log, so a
//! test can assert the exact sequence of calls a step made across handlers.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{
    EdgeHandler, EdgeRecord, HandlerError, NodeHandler, NodeRecord, StateCommit, StepContext,
};

/// Shared, ordered call log. Entries look like `"<label>:<record id>"`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// An empty journal; clone it into every double that should share it.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, label: &str, id: &str) {
        self.calls.lock().unwrap().push(format!("{label}:{id}"));
    }

    /// Snapshot of every call so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose label is `label`.
    pub fn count(&self, label: &str) -> usize {
        let prefix = format!("{label}:");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// Behaviour injected into a mock at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Return `Ok(())`.
    Succeed,
    /// Return `HandlerError::Retryable` with this message.
    FailRetryable(String),
    /// Return `HandlerError::Fatal` with this message.
    FailFatal(String),
}

impl MockBehaviour {
    fn outcome(&self) -> Result<(), HandlerError> {
        match self {
            Self::Succeed => Ok(()),
            Self::FailRetryable(msg) => Err(HandlerError::Retryable(msg.clone())),
            Self::FailFatal(msg) => Err(HandlerError::Fatal(msg.clone())),
        }
    }
}

/// Node handler double, usable in any of the on/before/after slots.
pub struct MockNodeHandler {
    /// Prefix of this double's journal entries.
    pub label: String,
    /// What every `handle` call returns.
    pub behaviour: MockBehaviour,
    journal: Journal,
}

impl MockNodeHandler {
    /// Records the call and succeeds.
    pub fn succeeding(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            behaviour: MockBehaviour::Succeed,
            journal: journal.clone(),
        }
    }

    /// Records the call and fails with `HandlerError::Fatal(msg)`.
    pub fn failing_fatal(label: impl Into<String>, msg: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            behaviour: MockBehaviour::FailFatal(msg.into()),
            journal: journal.clone(),
        }
    }

    /// Records the call and fails with `HandlerError::Retryable(msg)`.
    pub fn failing_retryable(
        label: impl Into<String>,
        msg: impl Into<String>,
        journal: &Journal,
    ) -> Self {
        Self {
            label: label.into(),
            behaviour: MockBehaviour::FailRetryable(msg.into()),
            journal: journal.clone(),
        }
    }
}

#[async_trait]
impl NodeHandler for MockNodeHandler {
    async fn handle(&self, node: &dyn NodeRecord, _ctx: &StepContext) -> Result<(), HandlerError> {
        self.journal.record(&self.label, node.id());
        self.behaviour.outcome()
    }
}

#[derive(Debug, Clone)]
enum Decision {
    Accept,
    Decline,
    Fail(String),
}

/// Decision handler double.
pub struct MockDecision {
    /// Prefix of this double's journal entries.
    pub label: String,
    decision: Decision,
    journal: Journal,
}

impl MockDecision {
    /// Records the call and accepts the edge.
    pub fn accepting(label: impl Into<String>, journal: &Journal) -> Self {
        Self::with(label, Decision::Accept, journal)
    }

    /// Records the call and declines the edge.
    pub fn declining(label: impl Into<String>, journal: &Journal) -> Self {
        Self::with(label, Decision::Decline, journal)
    }

    /// Records the call and fails with `HandlerError::Fatal(msg)`.
    pub fn failing(label: impl Into<String>, msg: impl Into<String>, journal: &Journal) -> Self {
        Self::with(label, Decision::Fail(msg.into()), journal)
    }

    fn with(label: impl Into<String>, decision: Decision, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            decision,
            journal: journal.clone(),
        }
    }
}

#[async_trait]
impl EdgeHandler for MockDecision {
    async fn decide(&self, edge: &dyn EdgeRecord, _ctx: &StepContext) -> Result<bool, HandlerError> {
        self.journal.record(&self.label, edge.id());
        match &self.decision {
            Decision::Accept => Ok(true),
            Decision::Decline => Ok(false),
            Decision::Fail(msg) => Err(HandlerError::Fatal(msg.clone())),
        }
    }
}

/// State-commit double.
pub struct MockCommit {
    /// Prefix of this double's journal entries.
    pub label: String,
    /// What every `commit` call returns.
    pub behaviour: MockBehaviour,
    journal: Journal,
}

impl MockCommit {
    /// Records the call and succeeds.
    pub fn succeeding(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            behaviour: MockBehaviour::Succeed,
            journal: journal.clone(),
        }
    }

    /// Records the call and fails with `HandlerError::Fatal(msg)`.
    pub fn failing(label: impl Into<String>, msg: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            behaviour: MockBehaviour::FailFatal(msg.into()),
            journal: journal.clone(),
        }
    }
}

#[async_trait]
impl StateCommit for MockCommit {
    async fn commit(&self, edge: &dyn EdgeRecord, _ctx: &StepContext) -> Result<(), HandlerError> {
        self.journal.record(&self.label, edge.id());
        self.behaviour.outcome()
    }
}
