//! Topology reduction.
//!
//! Pass 1 folds every remaining link placeholder into the parent chain of
//! its end nodes. Pass 2 removes parallel edges between the same two nodes,
//! keeping the highest-ranked device.

use std::collections::{BTreeMap, HashMap, HashSet};

use cyme_core::{CymeError, CymeResult, GlmObject, ObjectClass};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::config::CollapseStrategy;
use crate::context::NetworkContext;

/// Climb the node-parent chain of `name` to its root.
fn root(ctx: &NetworkContext<'_>, name: &str) -> String {
    let mut current = name.to_string();
    let mut visited = HashSet::new();
    while visited.insert(current.clone()) {
        let parent = ctx
            .graph
            .get(&current)
            .and_then(GlmObject::parent)
            .filter(|parent| {
                ctx.graph
                    .get(parent)
                    .is_some_and(|object| object.class.is_bus())
            });
        match parent {
            Some(parent) => current = parent.to_string(),
            None => break,
        }
    }
    current
}

fn is_swing(ctx: &NetworkContext<'_>, name: &str) -> bool {
    ctx.graph
        .get(name)
        .and_then(|object| object.get("bustype"))
        .is_some_and(|bustype| bustype == "SWING")
}

/// Fold one link into the parent chains of its nodes and remove it.
fn collapse_link(ctx: &mut NetworkContext<'_>, link: &str) {
    let endpoints = ctx.graph.get(link).and_then(|object| {
        Some((object.from_node()?.to_string(), object.to_node()?.to_string()))
    });
    let Some((from, to)) = endpoints.filter(|(from, to)| {
        ctx.graph.contains(from) && ctx.graph.contains(to)
    }) else {
        let err = CymeError::UnresolvedReference {
            object: link.to_string(),
            property: "from/to".to_string(),
            target: "node".to_string(),
        };
        ctx.warn(err.category(), &format!("link removal failed: {err}"), link);
        ctx.graph.remove(link);
        return;
    };

    let root_from = root(ctx, &from);
    let root_to = root(ctx, &to);
    if root_from != root_to {
        // the SWING bus stays a root
        if is_swing(ctx, &root_to) {
            ctx.graph.set_property(&root_from, "parent", to.as_str());
        } else {
            ctx.graph.set_property(&root_to, "parent", from.as_str());
        }
    }
    ctx.graph.remove(link);
    ctx.stats.collapsed_links += 1;
}

/// Re-parent every bus whose parent bus has a parent to that grandparent.
/// Returns true if anything changed.
fn shorten_chains(ctx: &mut NetworkContext<'_>) -> bool {
    let mut rewrites = Vec::new();
    for object in ctx.graph.iter().filter(|o| o.class.is_bus()) {
        let Some(parent) = object.parent().and_then(|p| ctx.graph.get(p)) else {
            continue;
        };
        if !parent.class.is_bus() {
            continue;
        }
        if let Some(grandparent) = parent.parent() {
            rewrites.push((object.name.clone(), grandparent.to_string()));
        }
    }

    let changed = !rewrites.is_empty();
    for (name, grandparent) in rewrites {
        if name == grandparent {
            ctx.warn(
                "reference",
                &format!("object '{name}' would become its own parent, object removed"),
                &name,
            );
            ctx.graph.remove(&name);
        } else if ctx.graph.contains(&name) {
            ctx.graph.set_property(&name, "parent", grandparent);
        }
    }
    changed
}

/// Pass 1: remove every link placeholder, turning it into a parent relation.
/// Returns the number of links collapsed.
pub fn collapse_links(ctx: &mut NetworkContext<'_>) -> CymeResult<usize> {
    let before = ctx.stats.collapsed_links;
    // every round removes all links or shortens at least one chain
    for _ in 0..=ctx.graph.len() {
        let links = ctx.graph.names_where(|o| o.class == ObjectClass::Link);
        let collapsed = !links.is_empty();
        for link in links {
            collapse_link(ctx, &link);
        }
        let shortened = match ctx.config.collapse_strategy {
            CollapseStrategy::ParentChains => shorten_chains(ctx),
            CollapseStrategy::LinksOnly => false,
        };
        if !collapsed && !shortened {
            break;
        }
    }
    let count = ctx.stats.collapsed_links - before;
    debug!(network = %ctx.network_id, count, "collapsed links");
    Ok(count)
}

/// Pass 2: keep one connecting object per node pair.
///
/// Among parallel objects the highest [`ObjectClass::edge_rank`] wins, the
/// first created on ties. A group whose best object is a plain line cannot be
/// reduced and fails the network.
pub fn deduplicate(ctx: &mut NetworkContext<'_>) -> CymeResult<usize> {
    let topology = ctx.graph.topology();
    let order: HashMap<&str, usize> = ctx
        .graph
        .iter()
        .enumerate()
        .map(|(i, object)| (object.name.as_str(), i))
        .collect();

    let mut groups: BTreeMap<(NodeIndex, NodeIndex), Vec<&str>> = BTreeMap::new();
    for edge in topology.graph.edge_references() {
        let (a, b) = (edge.source(), edge.target());
        if a == b {
            continue;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        groups.entry(key).or_default().push(edge.weight().as_str());
    }

    let mut losers = Vec::new();
    for ((a, b), mut names) in groups {
        if names.len() < 2 {
            continue;
        }
        names.sort_by_key(|name| order.get(name).copied().unwrap_or(usize::MAX));
        let rank = |name: &str| {
            ctx.graph
                .get(name)
                .map(|object| object.class.edge_rank())
                .unwrap_or(0)
        };
        let mut winner = names[0];
        for &name in &names[1..] {
            if rank(name) > rank(winner) {
                winner = name;
            }
        }
        if rank(winner) < 1 {
            let classes = names
                .iter()
                .filter_map(|name| ctx.graph.get(name))
                .map(|object| object.class.as_str().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CymeError::UnsupportedDuplicateTopology {
                from: topology.graph[a].clone(),
                to: topology.graph[b].clone(),
                classes,
            });
        }
        debug!(network = %ctx.network_id, kept = winner, removed = names.len() - 1, "parallel edges");
        losers.extend(
            names
                .into_iter()
                .filter(|name| *name != winner)
                .map(str::to_string),
        );
    }

    let removed = losers.len();
    for name in losers {
        ctx.graph.remove(&name);
    }
    ctx.stats.removed_duplicates += removed;
    Ok(removed)
}
