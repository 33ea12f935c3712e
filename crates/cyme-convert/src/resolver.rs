//! Node phases, head node selection and dangling-reference repair.

use std::collections::BTreeSet;

use cyme_core::{CymeError, CymeResult, MergeMode, ObjectClass, PhaseSet, Properties};
use tracing::debug;

use crate::context::NetworkContext;

/// Phases written on a node: the live phases seen on it plus neutral, or all
/// four when nothing was seen.
fn node_phases(live: PhaseSet) -> PhaseSet {
    if live.live().is_empty() {
        PhaseSet::ABCN
    } else {
        live.live().with_neutral()
    }
}

fn node_properties(phases: PhaseSet, bustype: &str) -> Properties {
    Properties::new()
        .with("phases", node_phases(phases).letters())
        .with("nominal_voltage", "${GLM_NOMINAL_VOLTAGE}")
        .with("bustype", bustype)
}

/// Raw node id of the network's head node, if it declares one.
pub fn head_node(ctx: &mut NetworkContext<'_>) -> CymeResult<Option<String>> {
    let rows = match ctx.network_rows("headnode") {
        Ok(rows) => rows,
        Err(CymeError::MissingTable(_)) => Vec::new(),
        Err(err) => return Err(err),
    };
    let heads: BTreeSet<&str> = rows.iter().filter_map(|row| row.get("NodeId")).collect();
    match heads.len() {
        0 => {
            let network = ctx.network_id.clone();
            ctx.warn(
                "head_node",
                &format!("network '{network}' has no head node, no SWING bus will be set"),
                &network,
            );
            Ok(None)
        }
        1 => Ok(heads.into_iter().next().map(str::to_string)),
        count => Err(CymeError::AmbiguousHeadNode {
            network: ctx.network_id.clone(),
            count,
        }),
    }
}

/// Create a node object for every node of the network. Node phases are the
/// union of the phases of the links placed on it.
pub fn map_nodes(ctx: &mut NetworkContext<'_>) -> CymeResult<()> {
    let head = head_node(ctx)?;
    for row in ctx.network_rows("node")? {
        let name = ctx.node_name(row.id());
        let bustype = if head.as_deref() == Some(row.id()) {
            "SWING"
        } else {
            "PQ"
        };
        let properties = node_properties(ctx.incident_phases(&name), bustype);
        ctx.graph.upsert(
            ctx.names,
            ObjectClass::Node,
            &name,
            row.id(),
            properties,
            MergeMode::Overwrite,
        )?;
    }

    if let Some(head) = head {
        let name = ctx.node_name(&head);
        if !ctx.graph.contains(&name) {
            let properties = node_properties(ctx.incident_phases(&name), "SWING");
            ctx.graph.upsert(
                ctx.names,
                ObjectClass::Node,
                &name,
                &head,
                properties,
                MergeMode::Overwrite,
            )?;
            ctx.stats.synthesized_nodes += 1;
            ctx.warn(
                "reference",
                &format!("head node '{head}' is not in the node table, node '{name}' created"),
                &name,
            );
        }
    }
    Ok(())
}

/// Make sure a node named `name` exists, creating a PQ node when it does not.
/// Returns true when a node was created.
pub fn ensure_node(
    ctx: &mut NetworkContext<'_>,
    name: &str,
    phases: PhaseSet,
    referrer: &str,
) -> CymeResult<bool> {
    if ctx.graph.contains(name) {
        return Ok(false);
    }
    let phases = phases | ctx.incident_phases(name);
    let source_id = name.split_once('_').map_or(name, |(_, id)| id).to_string();
    ctx.graph.upsert(
        ctx.names,
        ObjectClass::Node,
        name,
        &source_id,
        node_properties(phases, "PQ"),
        MergeMode::Overwrite,
    )?;
    ctx.stats.synthesized_nodes += 1;
    ctx.warn(
        "reference",
        &format!("object '{referrer}' refers to missing node '{name}', node created"),
        name,
    );
    Ok(true)
}

/// Synthesize every node referenced through `from`, `to` or `parent` that
/// does not exist. Running it twice creates nothing the second time.
pub fn repair(ctx: &mut NetworkContext<'_>) -> CymeResult<usize> {
    let mut dangling = Vec::new();
    for object in ctx.graph.iter() {
        let phases = object
            .get("phases")
            .and_then(PhaseSet::parse)
            .unwrap_or_default();
        for target in [object.from_node(), object.to_node(), object.parent()]
            .into_iter()
            .flatten()
        {
            if !ctx.graph.contains(target) {
                dangling.push((object.name.clone(), target.to_string(), phases));
            }
        }
    }

    let mut created = 0;
    for (referrer, target, phases) in dangling {
        if ensure_node(ctx, &target, phases, &referrer)? {
            created += 1;
        }
    }
    if created > 0 {
        debug!(network = %ctx.network_id, created, "synthesized missing nodes");
    }
    Ok(created)
}
