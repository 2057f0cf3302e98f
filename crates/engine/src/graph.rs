//! Read-only traversal view over a process definition.
//!
//! Built once by a single indexing pass; there is no mutation API. The graph
//! borrows the definition's records rather than copying them.
//!
//! Outgoing edges are kept sorted by ascending priority. Ties keep their
//! declaration order, so the evaluation order of a node's edges is fully
//! determined by the definition and never by hash-map iteration.

use std::collections::HashMap;

use handlers::{Edge, EdgeRecord, Node, NodeRecord};
use tracing::warn;

use crate::models::ProcessDefinition;
use crate::EngineError;

pub struct Graph<'d, N = Node, E = Edge> {
    nodes: &'d [N],
    edges: &'d [E],
    node_index: HashMap<&'d str, &'d N>,
    edge_index: HashMap<&'d str, &'d E>,
    outgoing: HashMap<&'d str, Vec<&'d E>>,
    incoming: HashMap<&'d str, Vec<&'d E>>,
}

impl<'d, N: NodeRecord, E: EdgeRecord> Graph<'d, N, E> {
    /// Index `definition`. Dangling edge endpoints are accepted here and only
    /// surface when traversal tries to resolve them. For a repeated ID the
    /// first declaration wins.
    pub fn new(definition: &'d ProcessDefinition<N, E>) -> Self {
        let mut node_index: HashMap<&str, &N> = HashMap::with_capacity(definition.nodes.len());
        for node in &definition.nodes {
            if node_index.contains_key(node.id()) {
                warn!(node_id = node.id(), "duplicate node ID ignored");
                continue;
            }
            node_index.insert(node.id(), node);
        }

        let mut edge_index: HashMap<&str, &E> = HashMap::with_capacity(definition.edges.len());
        let mut outgoing: HashMap<&str, Vec<&E>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&E>> = HashMap::new();
        for edge in &definition.edges {
            if edge_index.contains_key(edge.id()) {
                warn!(edge_id = edge.id(), "duplicate edge ID ignored");
                continue;
            }
            edge_index.insert(edge.id(), edge);
            outgoing.entry(edge.src_id()).or_default().push(edge);
            incoming.entry(edge.dst_id()).or_default().push(edge);
        }

        // `sort_by_key` is stable: equal priorities stay in declaration order.
        for edges in outgoing.values_mut() {
            edges.sort_by_key(|e| e.priority());
        }

        Self {
            nodes: &definition.nodes,
            edges: &definition.edges,
            node_index,
            edge_index,
            outgoing,
            incoming,
        }
    }

    pub fn node(&self, id: &str) -> Result<&'d N, EngineError> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::NodeNotFound(id.to_owned()))
    }

    pub fn edge(&self, id: &str) -> Option<&'d E> {
        self.edge_index.get(id).copied()
    }

    /// Edges leaving `node_id` in evaluation order. Empty for unknown nodes
    /// and for nodes with no outgoing edges.
    pub fn outgoing_edges(&self, node_id: &str) -> &[&'d E] {
        self.outgoing.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges arriving at `node_id`, in declaration order.
    pub fn incoming_edges(&self, node_id: &str) -> &[&'d E] {
        self.incoming.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Destinations of [`Graph::outgoing_edges`], same order. Edges whose
    /// destination is missing are skipped.
    pub fn next_nodes(&self, node_id: &str) -> Vec<&'d N> {
        self.outgoing_edges(node_id)
            .iter()
            .filter_map(|edge| self.node_index.get(edge.dst_id()).copied())
            .collect()
    }

    pub fn resolve_destination(&self, edge: &E) -> Result<&'d N, EngineError> {
        self.node_index
            .get(edge.dst_id())
            .copied()
            .ok_or_else(|| EngineError::DestinationUnresolved {
                edge_id: edge.id().to_owned(),
                dst_id: edge.dst_id().to_owned(),
            })
    }

    /// Nodes nobody transitions into, in declaration order. These are the
    /// usual candidates for an instance's entry node.
    pub fn entry_nodes(&self) -> Vec<&'d N> {
        self.unique_nodes()
            .filter(|node| self.incoming_edges(node.id()).is_empty())
            .collect()
    }

    /// Every declared node, in declaration order (duplicates included).
    pub fn nodes(&self) -> impl Iterator<Item = &'d N> + '_ {
        self.nodes.iter()
    }

    /// Every declared edge, in declaration order (duplicates included).
    pub fn edges(&self) -> impl Iterator<Item = &'d E> + '_ {
        self.edges.iter()
    }

    /// Number of distinct node IDs.
    pub fn len(&self) -> usize {
        self.node_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_index.is_empty()
    }

    fn unique_nodes(&self) -> impl Iterator<Item = &'d N> + '_ {
        self.nodes
            .iter()
            .filter(|node| self.node_index.get(node.id()).is_some_and(|n| std::ptr::eq(*n, *node)))
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), "step")
    }

    fn edge(id: &str, from: &str, to: &str, priority: i64) -> Edge {
        Edge::new(id, from, to, "route", priority)
    }

    fn ids<T: EdgeRecord>(edges: &[&T]) -> Vec<String> {
        edges.iter().map(|e| e.id().to_owned()).collect()
    }

    #[test]
    fn outgoing_edges_sorted_by_priority_not_declaration() {
        let def = ProcessDefinition::new(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![
                edge("to_d", "a", "d", 3),
                edge("to_b", "a", "b", 2),
                edge("to_c", "a", "c", 1),
            ],
        );
        let graph = Graph::new(&def);

        assert_eq!(ids(graph.outgoing_edges("a")), vec!["to_c", "to_b", "to_d"]);
        let next: Vec<_> = graph.next_nodes("a").into_iter().map(|n| n.id()).collect();
        assert_eq!(next, vec!["c", "b", "d"]);
    }

    #[test]
    fn equal_priorities_keep_declaration_order() {
        let def = ProcessDefinition::new(
            vec![node("a"), node("b")],
            vec![
                edge("second", "a", "b", 5),
                edge("first", "a", "b", 1),
                edge("third", "a", "b", 5),
                edge("fourth", "a", "b", 5),
            ],
        );
        let graph = Graph::new(&def);

        assert_eq!(
            ids(graph.outgoing_edges("a")),
            vec!["first", "second", "third", "fourth"]
        );
    }

    #[test]
    fn unknown_and_sink_nodes_have_no_outgoing_edges() {
        let def = ProcessDefinition::new(vec![node("a"), node("b")], vec![edge("e", "a", "b", 0)]);
        let graph = Graph::new(&def);

        assert!(graph.outgoing_edges("b").is_empty());
        assert!(graph.outgoing_edges("ghost").is_empty());
        assert!(graph.next_nodes("ghost").is_empty());
    }

    #[test]
    fn incoming_edges_follow_declaration_order() {
        let def = ProcessDefinition::new(
            vec![node("a"), node("b"), node("c")],
            vec![edge("from_b", "b", "c", 9), edge("from_a", "a", "c", 1)],
        );
        let graph = Graph::new(&def);

        assert_eq!(ids(graph.incoming_edges("c")), vec!["from_b", "from_a"]);
        assert!(graph.incoming_edges("a").is_empty());
    }

    #[test]
    fn node_lookup_miss_is_not_found() {
        let def: ProcessDefinition = ProcessDefinition::new(vec![node("a")], vec![]);
        let graph = Graph::new(&def);

        assert_eq!(graph.node("a").unwrap().id(), "a");
        assert!(matches!(graph.node("zz"), Err(EngineError::NodeNotFound(id)) if id == "zz"));
    }

    #[test]
    fn dangling_destination_is_deferred_until_resolution() {
        let def = ProcessDefinition::new(vec![node("a")], vec![edge("e", "a", "ghost", 0)]);
        let graph = Graph::new(&def);

        // construction and listing succeed
        assert_eq!(graph.outgoing_edges("a").len(), 1);
        assert!(graph.next_nodes("a").is_empty());

        let e = graph.edge("e").expect("edge indexed");
        assert!(matches!(
            graph.resolve_destination(e),
            Err(EngineError::DestinationUnresolved { edge_id, dst_id }) if edge_id == "e" && dst_id == "ghost"
        ));
    }

    #[test]
    fn first_declaration_wins_on_duplicate_ids() {
        let def = ProcessDefinition::new(
            vec![Node::new("a", "first", "step"), Node::new("a", "second", "step")],
            vec![edge("e", "a", "a", 1), edge("e", "a", "a", 0)],
        );
        let graph = Graph::new(&def);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node("a").unwrap().name(), "first");
        assert_eq!(graph.outgoing_edges("a").len(), 1);
        assert_eq!(graph.outgoing_edges("a")[0].priority(), 1);
        assert_eq!(graph.nodes().count(), 2);
    }

    #[test]
    fn entry_nodes_have_no_incoming_edges() {
        let def = ProcessDefinition::new(
            vec![node("request"), node("approve"), node("done"), node("orphan")],
            vec![edge("e1", "request", "approve", 1), edge("e2", "approve", "done", 1)],
        );
        let graph = Graph::new(&def);

        let entries: Vec<_> = graph.entry_nodes().into_iter().map(|n| n.id()).collect();
        assert_eq!(entries, vec!["request", "orphan"]);
    }
}
