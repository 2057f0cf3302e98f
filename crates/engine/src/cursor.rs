//! Caller-side position of one process instance.
//!
//! The engine is stateless; whoever drives an instance keeps its current node
//! somewhere. `Cursor` is the in-memory version of that bookkeeping. It moves
//! only when a step advances, so after a failed step it still points at the
//! node to retry.

use handlers::{EdgeRecord, NodeRecord, StepContext};
use serde::{Deserialize, Serialize};

use crate::executor::{Engine, StepOutcome};
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    current: String,
    /// Nodes left behind, oldest first.
    history: Vec<String>,
}

impl Cursor {
    /// Start an instance at `entry`.
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            current: entry.into(),
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Step the current node once and follow the transition, if any.
    pub async fn advance<'d, N: NodeRecord, E: EdgeRecord>(
        &mut self,
        engine: &Engine<'d, N, E>,
        ctx: &StepContext,
    ) -> Result<StepOutcome<'d, N, E>, EngineError> {
        let outcome = engine.step(&self.current, ctx).await?;
        if let StepOutcome::Advanced(transition) = &outcome {
            let previous = std::mem::replace(&mut self.current, transition.to.id().to_owned());
            self.history.push(previous);
        }
        Ok(outcome)
    }
}
