//! Handler dispatch table.
//!
//! Populated by the hosting application before the first step and treated as
//! read-only afterwards. There is no process-wide registry: build one value
//! and hand it to each [`crate::Engine`] that needs it. Cloning is cheap since
//! handlers are reference counted.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use handlers::{EdgeHandler, EdgeType, NodeHandler, NodeType};
use tracing::debug;

/// Maps type tags to handlers, one table per handler kind.
///
/// Lookups are exact-match; there is no wildcard or fallback handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    on: HashMap<NodeType, Arc<dyn NodeHandler>>,
    before: HashMap<NodeType, Arc<dyn NodeHandler>>,
    after: HashMap<NodeType, Arc<dyn NodeHandler>>,
    decision: HashMap<EdgeType, Arc<dyn EdgeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Core business logic for nodes of `node_type`. Required for every node
    /// that is stepped.
    pub fn register_on(
        &mut self,
        node_type: impl Into<NodeType>,
        handler: impl NodeHandler + 'static,
    ) -> &mut Self {
        let handler: Arc<dyn NodeHandler> = Arc::new(handler);
        insert(&mut self.on, "on", node_type.into(), handler);
        self
    }

    /// Runs on a node right before it becomes current through a transition.
    pub fn register_before(
        &mut self,
        node_type: impl Into<NodeType>,
        handler: impl NodeHandler + 'static,
    ) -> &mut Self {
        let handler: Arc<dyn NodeHandler> = Arc::new(handler);
        insert(&mut self.before, "before", node_type.into(), handler);
        self
    }

    /// Runs on a node once a transition out of it has been accepted.
    pub fn register_after(
        &mut self,
        node_type: impl Into<NodeType>,
        handler: impl NodeHandler + 'static,
    ) -> &mut Self {
        let handler: Arc<dyn NodeHandler> = Arc::new(handler);
        insert(&mut self.after, "after", node_type.into(), handler);
        self
    }

    /// Decides whether edges of `edge_type` are taken. Required for every
    /// edge that gets evaluated.
    pub fn register_decision(
        &mut self,
        edge_type: impl Into<EdgeType>,
        handler: impl EdgeHandler + 'static,
    ) -> &mut Self {
        let handler: Arc<dyn EdgeHandler> = Arc::new(handler);
        insert(&mut self.decision, "decision", edge_type.into(), handler);
        self
    }

    pub fn on_handler(&self, node_type: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.on.get(node_type)
    }

    pub fn before_handler(&self, node_type: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.before.get(node_type)
    }

    pub fn after_handler(&self, node_type: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.after.get(node_type)
    }

    pub fn decision_handler(&self, edge_type: &str) -> Option<&Arc<dyn EdgeHandler>> {
        self.decision.get(edge_type)
    }

    /// Node type tags with at least one handler of any kind, sorted.
    pub fn node_types(&self) -> Vec<&NodeType> {
        let tags: BTreeSet<&NodeType> = self
            .on
            .keys()
            .chain(self.before.keys())
            .chain(self.after.keys())
            .collect();
        tags.into_iter().collect()
    }

    /// Edge type tags with a decision handler, sorted.
    pub fn edge_types(&self) -> Vec<&EdgeType> {
        let mut tags: Vec<&EdgeType> = self.decision.keys().collect();
        tags.sort();
        tags
    }
}

fn insert<K, H>(table: &mut HashMap<K, Arc<H>>, kind: &str, tag: K, handler: Arc<H>)
where
    K: std::hash::Hash + Eq + fmt::Display,
    H: ?Sized,
{
    debug!(kind, %tag, "registering handler");
    if let Some(_previous) = table.insert(tag, handler) {
        debug!(kind, "replaced previously registered handler");
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("on", &sorted_tags(self.on.keys()))
            .field("before", &sorted_tags(self.before.keys()))
            .field("after", &sorted_tags(self.after.keys()))
            .field("decision", &sorted_tags(self.decision.keys()))
            .finish()
    }
}

fn sorted_tags<'a, K: fmt::Display + 'a>(keys: impl Iterator<Item = &'a K>) -> Vec<String> {
    let mut tags: Vec<String> = keys.map(ToString::to_string).collect();
    tags.sort();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use handlers::mock::{Journal, MockDecision, MockNodeHandler};
    use handlers::{Node, StepContext};
    use serde_json::json;

    #[test]
    fn lookups_are_exact_match_per_kind() {
        let journal = Journal::new();
        let mut registry = HandlerRegistry::new();
        registry
            .register_on("leave_request", MockNodeHandler::succeeding("on", &journal))
            .register_before("leave_approval", MockNodeHandler::succeeding("before", &journal))
            .register_decision("approval", MockDecision::accepting("decide", &journal));

        assert!(registry.on_handler("leave_request").is_some());
        assert!(registry.on_handler("leave_approval").is_none());
        assert!(registry.on_handler("leave").is_none());
        assert!(registry.before_handler("leave_approval").is_some());
        assert!(registry.after_handler("leave_approval").is_none());
        assert!(registry.decision_handler("approval").is_some());
        assert!(registry.decision_handler("complete").is_none());
    }

    #[tokio::test]
    async fn later_registration_replaces_earlier() {
        let journal = Journal::new();
        let mut registry = HandlerRegistry::new();
        registry.register_on("leave_request", MockNodeHandler::succeeding("old", &journal));
        registry.register_on("leave_request", MockNodeHandler::succeeding("new", &journal));

        let node = Node::new("n1", "Request", "leave_request");
        let ctx = StepContext::new(Default::default(), json!({}));
        registry
            .on_handler("leave_request")
            .expect("registered")
            .handle(&node, &ctx)
            .await
            .unwrap();

        assert_eq!(journal.calls(), vec!["new:n1"]);
    }

    #[test]
    fn registered_tags_are_listed_sorted() {
        let journal = Journal::new();
        let mut registry = HandlerRegistry::new();
        registry
            .register_after("b_type", MockNodeHandler::succeeding("after", &journal))
            .register_on("c_type", MockNodeHandler::succeeding("on", &journal))
            .register_on("a_type", MockNodeHandler::succeeding("on", &journal))
            .register_before("a_type", MockNodeHandler::succeeding("before", &journal))
            .register_decision("z_edge", MockDecision::accepting("d", &journal))
            .register_decision("m_edge", MockDecision::accepting("d", &journal));

        let nodes: Vec<_> = registry.node_types().into_iter().map(NodeType::as_str).collect();
        assert_eq!(nodes, vec!["a_type", "b_type", "c_type"]);
        let edges: Vec<_> = registry.edge_types().into_iter().map(EdgeType::as_str).collect();
        assert_eq!(edges, vec!["m_edge", "z_edge"]);
    }
}
