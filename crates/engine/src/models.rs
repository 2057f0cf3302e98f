//! Process definitions.
//!
//! A definition is supplied once by the hosting application and stays
//! read-only for the engine's lifetime. It is usually deserialised from the
//! JSON the application stores alongside the process template.

use handlers::{Edge, Node};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::EngineError;

/// The nodes and edges of one workflow template, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition<N = Node, E = Edge> {
    pub nodes: Vec<N>,
    pub edges: Vec<E>,
}

impl<N, E> ProcessDefinition<N, E> {
    pub fn new(nodes: Vec<N>, edges: Vec<E>) -> Self {
        Self { nodes, edges }
    }
}

impl<N, E> Default for ProcessDefinition<N, E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<N: DeserializeOwned, E: DeserializeOwned> ProcessDefinition<N, E> {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(json: &[u8]) -> Result<Self, EngineError> {
        Ok(serde_json::from_slice(json)?)
    }
}

impl<N: handlers::NodeRecord, E: handlers::EdgeRecord> ProcessDefinition<N, E> {
    /// Index this definition for traversal.
    pub fn graph(&self) -> Graph<'_, N, E> {
        Graph::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handlers::{EdgeRecord, NodeRecord};

    const LEAVE_PROCESS: &str = r#"{
        "nodes": [
            { "id": "leave_request",  "name": "Leave request",  "nodeType": "leave_request",  "node_extras": null },
            { "id": "leave_approval", "name": "Leave approval", "nodeType": "leave_approval", "node_extras": { "approvers": ["lead"] } },
            { "id": "leave_complete", "name": "Leave complete", "nodeType": "leave_complete" }
        ],
        "edges": [
            { "id": "approval_edge", "srcId": "leave_request",  "dstId": "leave_approval", "priority": 1, "line_type": "approval" },
            { "id": "complete_edge", "srcId": "leave_approval", "dstId": "leave_complete", "priority": 1, "line_type": "complete" }
        ]
    }"#;

    #[test]
    fn parses_stored_definition() {
        let def: ProcessDefinition = ProcessDefinition::from_json_str(LEAVE_PROCESS).expect("valid json");

        assert_eq!(def.nodes.len(), 3);
        assert_eq!(def.edges.len(), 2);
        assert_eq!(def.nodes[1].node_type(), "leave_approval");
        assert!(!def.nodes[1].extras().is_empty());
        assert!(def.nodes[2].extras().is_empty());
        assert_eq!(def.edges[1].edge_type(), "complete");
    }

    #[test]
    fn malformed_definition_is_reported() {
        let result: Result<ProcessDefinition, _> = ProcessDefinition::from_json_str(r#"{ "nodes": 3 }"#);
        assert!(matches!(result, Err(EngineError::Definition(_))));
    }
}
