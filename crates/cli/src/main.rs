//! `flowctl`: offline checks for process definition files.
//!
//! Available sub-commands:
//! - `validate`: report duplicate IDs and dangling edge endpoints.
//! - `edges`: list outgoing edges in the order the engine evaluates them.
//! - `entries`: list nodes with no incoming edges.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use engine::{validate_definition, Graph, ProcessDefinition};
use handlers::{EdgeRecord, NodeRecord};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "flowctl",
    about = "Inspect approval process definitions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a process definition JSON file.
    Validate {
        /// Path to the process definition JSON file.
        #[arg(env = "FLOW_DEFINITION")]
        path: PathBuf,
    },
    /// Print outgoing edges per node in evaluation order.
    Edges {
        #[arg(env = "FLOW_DEFINITION")]
        path: PathBuf,
        /// Only print edges leaving this node.
        #[arg(long)]
        node: Option<String>,
    },
    /// Print the nodes nothing transitions into.
    Entries {
        #[arg(env = "FLOW_DEFINITION")]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { path } => {
            let definition = load(&path)?;
            let report = validate_definition(&definition, None);
            if report.is_ok() {
                println!(
                    "✅ Definition is valid: {} nodes, {} edges.",
                    definition.nodes.len(),
                    definition.edges.len()
                );
                return Ok(());
            }
            for issue in report.issues() {
                eprintln!("❌ {issue}");
            }
            std::process::exit(1);
        }
        Command::Edges { path, node } => {
            let definition = load(&path)?;
            let graph = Graph::new(&definition);
            if let Some(id) = &node {
                graph.node(id)?;
            }
            for line in render_edges(&graph, node.as_deref()) {
                println!("{line}");
            }
        }
        Command::Entries { path } => {
            let definition = load(&path)?;
            let graph = Graph::new(&definition);
            for node in graph.entry_nodes() {
                println!("{}\t{}\t{}", node.id(), node.node_type(), node.name());
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<ProcessDefinition> {
    info!("Loading process definition from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    let definition = ProcessDefinition::from_json_str(&content)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    debug!(
        nodes = definition.nodes.len(),
        edges = definition.edges.len(),
        "definition loaded"
    );
    Ok(definition)
}

/// One line per outgoing edge: `<src> -> <dst> [<edge id>] type=<t> priority=<p>`.
/// Nodes are listed in declaration order; `only` restricts to a single node.
fn render_edges(graph: &Graph<'_>, only: Option<&str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut lines = Vec::new();
    for node in graph.nodes() {
        if only.is_some_and(|id| id != node.id()) || !seen.insert(node.id()) {
            continue;
        }
        let edges = graph.outgoing_edges(node.id());
        if edges.is_empty() {
            lines.push(format!("{} (no outgoing edges)", node.id()));
            continue;
        }
        for edge in edges {
            lines.push(format!(
                "{} -> {} [{}] type={} priority={}",
                edge.src_id(),
                edge.dst_id(),
                edge.id(),
                edge.edge_type(),
                edge.priority()
            ));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "nodes": [
            { "id": "request",  "name": "Request",  "nodeType": "leave_request" },
            { "id": "director", "name": "Director", "nodeType": "leave_approval" },
            { "id": "lead",     "name": "Lead",     "nodeType": "leave_approval" }
        ],
        "edges": [
            { "id": "long_leave",  "srcId": "request", "dstId": "director", "priority": 2, "line_type": "approval" },
            { "id": "short_leave", "srcId": "request", "dstId": "lead",     "priority": 1, "line_type": "approval" }
        ]
    }"#;

    #[test]
    fn edges_are_rendered_in_evaluation_order() {
        let definition = ProcessDefinition::from_json_str(DEFINITION).unwrap();
        let graph = Graph::new(&definition);

        assert_eq!(
            render_edges(&graph, Some("request")),
            vec![
                "request -> lead [short_leave] type=approval priority=1",
                "request -> director [long_leave] type=approval priority=2",
            ]
        );
    }

    #[test]
    fn sink_nodes_are_marked() {
        let definition = ProcessDefinition::from_json_str(DEFINITION).unwrap();
        let graph = Graph::new(&definition);

        let lines = render_edges(&graph, None);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "director (no outgoing edges)");
        assert_eq!(lines[3], "lead (no outgoing edges)");
    }

    #[test]
    fn cli_parses_edges_filter() {
        let cli = Cli::try_parse_from(["flowctl", "edges", "leave.json", "--node", "request"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Edges { node: Some(ref n), .. } if n == "request"
        ));
    }
}
