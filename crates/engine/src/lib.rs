//! `engine` crate: process graph, handler registry and single-step traversal.

pub mod models;
pub mod error;
pub mod graph;
pub mod registry;
pub mod validate;
pub mod executor;
pub mod cursor;

pub use models::ProcessDefinition;
pub use error::{EngineError, HandlerKind};
pub use graph::Graph;
pub use registry::HandlerRegistry;
pub use validate::{validate_definition, Issue, ValidationReport};
pub use executor::{Engine, EngineConfig, StepOutcome, Transition};
pub use cursor::Cursor;
