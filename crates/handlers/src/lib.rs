//! `handlers` crate: the contracts shared by the engine and business logic.
//!
//! Approval rules live outside this workspace. They implement [`NodeHandler`],
//! [`EdgeHandler`] or [`StateCommit`] against the record capabilities defined
//! in [`record`], and the engine dispatches to them through trait objects.

pub mod error;
pub mod record;
pub mod traits;
pub mod mock;

pub use error::HandlerError;
pub use record::{Edge, EdgeRecord, EdgeType, Extras, Node, NodeRecord, NodeType};
pub use traits::{EdgeHandler, NodeHandler, StateCommit, StepContext};
