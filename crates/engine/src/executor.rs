//! Single-step traversal.
//!
//! `Engine::step` is the central orchestrator for one move of one process
//! instance:
//! 1. Resolves the node and runs its on-handler.
//! 2. Evaluates outgoing edges in priority order until one is accepted.
//! 3. For the accepted edge runs, in this order: the source's after-handler,
//!    the state-commit callback, the destination's before-handler.
//!
//! The engine keeps no execution state. The caller owns the instance's
//! current node and decides whether to step again; the engine never recurses
//! into the destination on its own and never retries.

use std::sync::Arc;

use handlers::{Edge, EdgeRecord, HandlerError, Node, NodeRecord, StateCommit, StepContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::graph::Graph;
use crate::registry::HandlerRegistry;
use crate::validate::missing_handlers;
use crate::{EngineError, HandlerKind};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse to build an engine whose registry lacks an on-handler for any
    /// node type, or a decision-handler for any edge type, in the graph.
    /// Off by default: missing handlers are then reported by the step that
    /// needs them.
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// Output of a step
// ---------------------------------------------------------------------------

/// An accepted move from one node to another.
#[derive(Debug)]
pub struct Transition<'d, N = Node, E = Edge> {
    pub from: &'d N,
    pub edge: &'d E,
    pub to: &'d N,
}

/// How a successful step ended.
#[derive(Debug)]
pub enum StepOutcome<'d, N = Node, E = Edge> {
    /// An edge was accepted; the instance should now sit at `to`.
    Advanced(Transition<'d, N, E>),
    /// The node has outgoing edges but none accepted (e.g. pending approval).
    Waiting { node: &'d N },
    /// The node has no outgoing edges.
    Finished { node: &'d N },
}

impl<'d, N: NodeRecord, E: EdgeRecord> StepOutcome<'d, N, E> {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }

    /// Where the instance sits after this step.
    pub fn current_node(&self) -> &'d N {
        match self {
            Self::Advanced(t) => t.to,
            Self::Waiting { node } | Self::Finished { node } => *node,
        }
    }

    pub fn transition(&self) -> Option<&Transition<'d, N, E>> {
        match self {
            Self::Advanced(t) => Some(t),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless coordinator over one graph and one registry.
///
/// Holds no per-instance state, so a single engine can step any number of
/// instances concurrently as long as the registered handlers allow it.
pub struct Engine<'d, N = Node, E = Edge> {
    graph: Graph<'d, N, E>,
    registry: HandlerRegistry,
    commit: Option<Arc<dyn StateCommit>>,
    config: EngineConfig,
}

impl<'d, N: NodeRecord, E: EdgeRecord> Engine<'d, N, E> {
    /// Create an engine with the default (non-strict) configuration.
    pub fn new(graph: Graph<'d, N, E>, registry: HandlerRegistry) -> Self {
        Self {
            graph,
            registry,
            commit: None,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine, checking handler coverage up front when
    /// `config.strict` is set.
    ///
    /// # Errors
    /// [`EngineError::HandlerNotFound`] for the first node type without an
    /// on-handler or edge type without a decision-handler.
    pub fn try_new(
        graph: Graph<'d, N, E>,
        registry: HandlerRegistry,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let engine = Self::new(graph, registry).with_config(config);
        if engine.config.strict {
            engine.check_coverage()?;
        }
        Ok(engine)
    }

    /// Replace the configuration.
    ///
    /// This only stores `config`. Coverage is enforced by [`Engine::try_new`]
    /// or an explicit [`Engine::check_coverage`] call.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the state-commit callback invoked for every accepted edge.
    pub fn with_commit(mut self, commit: impl StateCommit + 'static) -> Self {
        self.commit = Some(Arc::new(commit));
        self
    }

    /// Check that every node type in the graph has an on-handler and every
    /// edge type a decision-handler, regardless of `config.strict`.
    ///
    /// # Errors
    /// [`EngineError::HandlerNotFound`] for the first uncovered type.
    pub fn check_coverage(&self) -> Result<(), EngineError> {
        match missing_handlers(self.graph.nodes(), self.graph.edges(), &self.registry)
            .into_iter()
            .next()
        {
            Some(missing) => Err(missing.into()),
            None => Ok(()),
        }
    }

    pub fn graph(&self) -> &Graph<'d, N, E> {
        &self.graph
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance the instance currently sitting at `node_id` by one step.
    ///
    /// Any failure aborts the step at that point and is returned; handlers
    /// that already ran are not rolled back. `ctx` is handed unchanged to
    /// every handler call.
    ///
    /// # Errors
    /// - [`EngineError::NodeNotFound`] if `node_id` is not in the graph.
    /// - [`EngineError::HandlerNotFound`] for a missing on-handler, or a
    ///   missing decision-handler on an edge that gets evaluated.
    /// - [`EngineError::HandlerExecution`] wrapping any handler or
    ///   state-commit failure.
    /// - [`EngineError::DestinationUnresolved`] if the accepted edge points
    ///   at a node missing from the graph.
    #[instrument(skip(self, ctx), fields(instance_id = %ctx.instance_id))]
    pub async fn step(
        &self,
        node_id: &str,
        ctx: &StepContext,
    ) -> Result<StepOutcome<'d, N, E>, EngineError> {
        // ------------------------------------------------------------------
        // Node business logic.
        // ------------------------------------------------------------------
        let node = self.graph.node(node_id)?;

        let on = self
            .registry
            .on_handler(node.node_type())
            .ok_or_else(|| EngineError::HandlerNotFound {
                kind: HandlerKind::On,
                tag: node.node_type().to_owned(),
            })?;
        on.handle(node, ctx)
            .await
            .map_err(|e| handler_failed(HandlerKind::On, node.id(), e))?;

        // ------------------------------------------------------------------
        // Pick the first accepted edge, lowest priority first.
        // ------------------------------------------------------------------
        let edges = self.graph.outgoing_edges(node_id);
        if edges.is_empty() {
            debug!("no outgoing edges, instance finished");
            return Ok(StepOutcome::Finished { node });
        }

        let mut accepted = None;
        for &edge in edges {
            if self.evaluate_edge(edge, ctx).await? {
                accepted = Some(edge);
                break;
            }
        }

        let Some(edge) = accepted else {
            debug!(candidates = edges.len(), "no edge accepted, instance waiting");
            return Ok(StepOutcome::Waiting { node });
        };
        debug!(edge_id = edge.id(), dst_id = edge.dst_id(), "edge accepted");

        // ------------------------------------------------------------------
        // after(source) → commit(edge) → before(destination)
        // ------------------------------------------------------------------
        if let Some(after) = self.registry.after_handler(node.node_type()) {
            after
                .handle(node, ctx)
                .await
                .map_err(|e| handler_failed(HandlerKind::After, node.id(), e))?;
        }

        if let Some(commit) = &self.commit {
            commit
                .commit(edge, ctx)
                .await
                .map_err(|e| handler_failed(HandlerKind::Commit, edge.id(), e))?;
        }

        let to = self.graph.resolve_destination(edge)?;

        if let Some(before) = self.registry.before_handler(to.node_type()) {
            before
                .handle(to, ctx)
                .await
                .map_err(|e| handler_failed(HandlerKind::Before, to.id(), e))?;
        }

        debug!(from = node.id(), to = to.id(), "transition complete");
        Ok(StepOutcome::Advanced(Transition {
            from: node,
            edge,
            to,
        }))
    }

    /// Run the decision-handler for a single edge.
    ///
    /// # Errors
    /// [`EngineError::HandlerNotFound`] if the edge type has no decision
    /// handler, [`EngineError::HandlerExecution`] if the handler fails.
    pub async fn evaluate_edge(&self, edge: &E, ctx: &StepContext) -> Result<bool, EngineError> {
        let decide = self
            .registry
            .decision_handler(edge.edge_type())
            .ok_or_else(|| EngineError::HandlerNotFound {
                kind: HandlerKind::Decision,
                tag: edge.edge_type().to_owned(),
            })?;

        let accepted = decide
            .decide(edge, ctx)
            .await
            .map_err(|e| handler_failed(HandlerKind::Decision, edge.id(), e))?;

        debug!(
            edge_id = edge.id(),
            priority = edge.priority(),
            accepted,
            "edge evaluated"
        );
        Ok(accepted)
    }
}

fn handler_failed(kind: HandlerKind, target: &str, source: HandlerError) -> EngineError {
    warn!(%kind, target_id = target, error = %source, "handler failed, aborting step");
    EngineError::HandlerExecution {
        kind,
        target: target.to_owned(),
        source,
    }
}
