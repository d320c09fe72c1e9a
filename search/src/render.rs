//! Graphviz DOT rendering of a search graph.
//!
//! Output is deterministic: nodes in fingerprint order, edges in insertion
//! order. Best-path nodes and edges are drawn bold/red once
//! [`SearchGraph::best_path`] has marked them.

use std::fmt::Write as _;

use crate::graph::SearchGraph;

/// Render `graph` as a DOT digraph.
#[must_use]
pub fn render_dot(graph: &SearchGraph) -> String {
    let mut out = String::from("digraph search {\n");
    out.push_str("  node [shape=box, style=filled, fontname=\"monospace\"];\n");

    for node in graph.nodes() {
        let _ = write!(
            out,
            "  \"{}\" [label=\"{}\", fillcolor=\"{}\"",
            node.fingerprint.short(),
            escape(&node.label),
            node.fill_color
        );
        if node.on_best_path {
            out.push_str(", color=red, penwidth=3");
        }
        out.push_str("];\n");
    }

    for edge in graph.edges() {
        let _ = write!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"",
            edge.from.short(),
            edge.to.short(),
            escape(&edge.action)
        );
        if edge.on_best_path {
            out.push_str(", color=red, penwidth=3");
        }
        out.push_str("];\n");
    }

    out.push_str("}\n");
    out
}

/// Escape text for a double-quoted DOT string. Newlines become DOT `\n`
/// line breaks.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}
