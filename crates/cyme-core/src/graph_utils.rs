use crate::graph::{ObjectGraph, Topology};
use crate::object::ObjectClass;
use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;

/// Summary of a converted network's topology, reported after conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyStats {
    pub bus_count: usize,
    pub edge_count: usize,
    pub parent_count: usize,
    /// Connected components once `parent` attachments are counted as edges
    pub islands: usize,
    pub max_degree: usize,
}

/// Multigraph of buses joined by both edge devices and `parent` attachments.
/// Parent edges are weighted with the child object's name prefixed by `^`.
pub fn network_map(objects: &ObjectGraph) -> Topology {
    let mut map = objects.topology();
    for object in objects.iter() {
        if let Some(parent) = object.parent() {
            let child = node_index(&mut map, &object.name);
            let parent = node_index(&mut map, parent);
            map.graph.add_edge(child, parent, format!("^{}", object.name));
        }
    }
    for object in objects.iter().filter(|o| o.class.is_bus()) {
        node_index(&mut map, &object.name);
    }
    map
}

fn node_index(map: &mut Topology, name: &str) -> petgraph::graph::NodeIndex {
    if let Some(&idx) = map.nodes.get(name) {
        return idx;
    }
    let idx = map.graph.add_node(name.to_string());
    map.nodes.insert(name.to_string(), idx);
    idx
}

/// Counts buses, edges and islands of the converted network.
pub fn topology_stats(objects: &ObjectGraph) -> TopologyStats {
    let map = network_map(objects);
    let parent_count = map
        .graph
        .edge_weights()
        .filter(|w| w.starts_with('^'))
        .count();
    let max_degree = map
        .graph
        .node_indices()
        .map(|n| map.graph.edges(n).count())
        .max()
        .unwrap_or(0);
    TopologyStats {
        bus_count: map.graph.node_count(),
        edge_count: map.graph.edge_count() - parent_count,
        parent_count,
        islands: connected_components(&map.graph),
        max_degree,
    }
}

/// Export the network map so external tools can draw it.
pub fn export_graph(objects: &ObjectGraph, name: &str, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(objects, name)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(objects: &ObjectGraph, name: &str) -> String {
    let map = network_map(objects);
    let mut buffer = String::new();
    buffer.push_str(&format!("graph \"{}\" {{\n", sanitize_label(name)));
    for node in map.graph.node_indices() {
        let label = &map.graph[node];
        let shape = match objects.get(label).map(|o| &o.class) {
            Some(ObjectClass::Load) => "box",
            Some(ObjectClass::Node) => "ellipse",
            _ => "point",
        };
        let swing = objects
            .get(label)
            .and_then(|o| o.get("bustype"))
            .is_some_and(|b| b == "SWING");
        let style = if swing { ", style=bold" } else { "" };
        buffer.push_str(&format!(
            "  n{} [label=\"{}\", shape={}{}];\n",
            node.index(),
            sanitize_label(label),
            shape,
            style
        ));
    }
    for edge in map.graph.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        let weight = edge.weight();
        if weight.starts_with('^') {
            buffer.push_str(&format!("  n{source} -- n{target} [style=dashed];\n"));
        } else {
            let class = objects
                .get(weight)
                .map(|o| o.class.as_str().to_string())
                .unwrap_or_default();
            buffer.push_str(&format!(
                "  n{source} -- n{target} [label=\"{}\", tooltip=\"{}\"];\n",
                sanitize_label(&class),
                sanitize_label(weight)
            ));
        }
    }
    buffer.push('}');
    buffer.push('\n');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}
