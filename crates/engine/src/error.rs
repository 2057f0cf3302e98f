//! Engine-level error types.

use std::fmt;

use handlers::HandlerError;
use thiserror::Error;

use crate::validate::Issue;

/// Which registry slot (or callback) a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    On,
    Before,
    After,
    Decision,
    Commit,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Before => "before",
            Self::After => "after",
            Self::Decision => "decision",
            Self::Commit => "state-commit",
        })
    }
}

/// Errors produced by the engine (definition loading, validation, stepping).
///
/// Every variant aborts the current step. The caller's instance position is
/// still the node it passed in, so stepping it again is the recovery path.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Lookup errors ------

    /// No node with this ID in the graph.
    #[error("node '{0}' not found")]
    NodeNotFound(String),

    /// A required dispatch has nothing registered for the type tag.
    #[error("no {kind} handler registered for type '{tag}'")]
    HandlerNotFound { kind: HandlerKind, tag: String },

    /// An accepted edge points at a node the graph does not contain.
    #[error("edge '{edge_id}' points at unknown node '{dst_id}'")]
    DestinationUnresolved { edge_id: String, dst_id: String },

    // ------ Handler errors ------

    /// A registered handler returned an error; carried unchanged as `source`.
    #[error("{kind} handler failed on '{target}'")]
    HandlerExecution {
        kind: HandlerKind,
        /// ID of the node or edge the handler was invoked on.
        target: String,
        #[source]
        source: HandlerError,
    },

    // ------ Definition errors ------

    #[error("invalid process definition: {0}")]
    Invalid(Issue),

    #[error("malformed process definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl EngineError {
    /// The handler's own error, if this failure came from a handler call.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            Self::HandlerExecution { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<HandlerError> {
        match self {
            Self::HandlerExecution { source, .. } => Some(source),
            _ => None,
        }
    }
}
