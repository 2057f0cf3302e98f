//! Definition checks: run these when a process template is saved or loaded.
//!
//! Checks performed:
//! 1. Node IDs must be unique within the definition.
//! 2. Edge IDs must be unique within the definition.
//! 3. Every edge must reference declared nodes at both ends.
//! 4. With a registry: every node type has an on-handler and every edge type
//!    has a decision-handler.
//!
//! Nothing here runs implicitly during traversal. A definition that fails
//! these checks can still be stepped; its problems surface as lookup errors
//! when traversal reaches them.

use std::collections::HashSet;

use handlers::{EdgeRecord, NodeRecord};
use thiserror::Error;

use crate::models::ProcessDefinition;
use crate::registry::HandlerRegistry;
use crate::{EngineError, HandlerKind};

/// One problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("duplicate node ID '{0}'")]
    DuplicateNodeId(String),

    #[error("duplicate edge ID '{0}'")]
    DuplicateEdgeId(String),

    #[error("edge '{edge_id}' starts at unknown node '{node_id}'")]
    DanglingSource { edge_id: String, node_id: String },

    #[error("edge '{edge_id}' ends at unknown node '{node_id}'")]
    DanglingDestination { edge_id: String, node_id: String },

    #[error("no on-handler registered for node type '{0}'")]
    MissingOnHandler(String),

    #[error("no decision-handler registered for edge type '{0}'")]
    MissingDecisionHandler(String),
}

/// Every issue found, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// `Err` carrying the first issue, if there is one.
    pub fn into_result(self) -> Result<(), EngineError> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(EngineError::Invalid(issue)),
            None => Ok(()),
        }
    }
}

/// Check `definition`, optionally against the handlers in `registry`.
pub fn validate_definition<N: NodeRecord, E: EdgeRecord>(
    definition: &ProcessDefinition<N, E>,
    registry: Option<&HandlerRegistry>,
) -> ValidationReport {
    let mut issues = Vec::new();

    // -----------------------------------------------------------------------
    // 1. Unique node IDs
    // -----------------------------------------------------------------------
    let mut node_ids: HashSet<&str> = HashSet::with_capacity(definition.nodes.len());
    for node in &definition.nodes {
        if !node_ids.insert(node.id()) {
            issues.push(Issue::DuplicateNodeId(node.id().to_owned()));
        }
    }

    // -----------------------------------------------------------------------
    // 2. Unique edge IDs
    // -----------------------------------------------------------------------
    let mut edge_ids: HashSet<&str> = HashSet::with_capacity(definition.edges.len());
    for edge in &definition.edges {
        if !edge_ids.insert(edge.id()) {
            issues.push(Issue::DuplicateEdgeId(edge.id().to_owned()));
        }
    }

    // -----------------------------------------------------------------------
    // 3. Edge endpoints
    // -----------------------------------------------------------------------
    for edge in &definition.edges {
        if !node_ids.contains(edge.src_id()) {
            issues.push(Issue::DanglingSource {
                edge_id: edge.id().to_owned(),
                node_id: edge.src_id().to_owned(),
            });
        }
        if !node_ids.contains(edge.dst_id()) {
            issues.push(Issue::DanglingDestination {
                edge_id: edge.id().to_owned(),
                node_id: edge.dst_id().to_owned(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // 4. Handler coverage
    // -----------------------------------------------------------------------
    if let Some(registry) = registry {
        issues.extend(
            missing_handlers(&definition.nodes, &definition.edges, registry)
                .into_iter()
                .map(Issue::from),
        );
    }

    ValidationReport { issues }
}

/// A type tag the registry cannot dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MissingHandler {
    On(String),
    Decision(String),
}

impl From<MissingHandler> for Issue {
    fn from(missing: MissingHandler) -> Self {
        match missing {
            MissingHandler::On(tag) => Issue::MissingOnHandler(tag),
            MissingHandler::Decision(tag) => Issue::MissingDecisionHandler(tag),
        }
    }
}

impl From<MissingHandler> for EngineError {
    fn from(missing: MissingHandler) -> Self {
        match missing {
            MissingHandler::On(tag) => EngineError::HandlerNotFound {
                kind: HandlerKind::On,
                tag,
            },
            MissingHandler::Decision(tag) => EngineError::HandlerNotFound {
                kind: HandlerKind::Decision,
                tag,
            },
        }
    }
}

/// Node types without an on-handler and edge types without a decision-handler,
/// each reported once, in first-seen order.
pub(crate) fn missing_handlers<'a, N, E>(
    nodes: impl IntoIterator<Item = &'a N>,
    edges: impl IntoIterator<Item = &'a E>,
    registry: &HandlerRegistry,
) -> Vec<MissingHandler>
where
    N: NodeRecord + 'a,
    E: EdgeRecord + 'a,
{
    let mut missing = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        let tag = node.node_type();
        if seen.insert(tag) && registry.on_handler(tag).is_none() {
            missing.push(MissingHandler::On(tag.to_owned()));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for edge in edges {
        let tag = edge.edge_type();
        if seen.insert(tag) && registry.decision_handler(tag).is_none() {
            missing.push(MissingHandler::Decision(tag.to_owned()));
        }
    }

    missing
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use handlers::mock::{Journal, MockDecision, MockNodeHandler};
    use handlers::{Edge, Node};

    fn leave_process() -> ProcessDefinition {
        ProcessDefinition::new(
            vec![
                Node::new("leave_request", "Leave request", "leave_request"),
                Node::new("leave_approval", "Leave approval", "leave_approval"),
                Node::new("leave_complete", "Leave complete", "leave_complete"),
            ],
            vec![
                Edge::new("approval_edge", "leave_request", "leave_approval", "approval", 1),
                Edge::new("complete_edge", "leave_approval", "leave_complete", "complete", 1),
            ],
        )
    }

    #[test]
    fn well_formed_definition_passes() {
        let report = validate_definition(&leave_process(), None);
        assert!(report.is_ok());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let mut def = leave_process();
        def.nodes.push(Node::new("leave_request", "again", "leave_request"));
        def.edges.push(Edge::new("approval_edge", "leave_request", "leave_approval", "approval", 2));

        let report = validate_definition(&def, None);
        assert_eq!(
            report.issues(),
            &[
                Issue::DuplicateNodeId("leave_request".into()),
                Issue::DuplicateEdgeId("approval_edge".into()),
            ]
        );
    }

    #[test]
    fn dangling_endpoints_are_reported() {
        let mut def = leave_process();
        def.edges.push(Edge::new("reject_edge", "ghost", "nowhere", "reject", 2));

        let report = validate_definition(&def, None);
        assert_eq!(report.issues().len(), 2);
        assert!(matches!(
            &report.issues()[0],
            Issue::DanglingSource { edge_id, node_id } if edge_id == "reject_edge" && node_id == "ghost"
        ));
        assert!(matches!(
            report.into_result(),
            Err(EngineError::Invalid(Issue::DanglingSource { .. }))
        ));
    }

    #[test]
    fn missing_handlers_are_reported_once_per_type() {
        let journal = Journal::new();
        let mut registry = HandlerRegistry::new();
        registry
            .register_on("leave_request", MockNodeHandler::succeeding("on", &journal))
            .register_decision("approval", MockDecision::accepting("d", &journal));

        let mut def = leave_process();
        def.nodes.push(Node::new("second_approval", "Second approval", "leave_approval"));

        let report = validate_definition(&def, Some(&registry));
        assert_eq!(
            report.issues(),
            &[
                Issue::MissingOnHandler("leave_approval".into()),
                Issue::MissingOnHandler("leave_complete".into()),
                Issue::MissingDecisionHandler("complete".into()),
            ]
        );
    }
}
