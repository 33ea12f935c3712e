//! Switches, breakers, reclosers and fuses.
//!
//! The closed-phase code of the device decides the state of each phase; only
//! phases present on the device's section are written.

use cyme_core::{CymeResult, MergeMode, ObjectClass, PhaseSet, Properties};
use cyme_io::Row;

use super::{edge_phases, phase_column, placeholder, MapOutcome};
use crate::context::NetworkContext;

/// Properties for the per-phase states of a switch-like device.
fn phase_states(
    properties: &mut Properties,
    present: PhaseSet,
    closed: PhaseSet,
    key: &str,
    [on, off]: [&str; 2],
) -> bool {
    let mut states = Vec::new();
    for phase in present.live_phases() {
        let state = if closed.contains(phase) { on } else { off };
        properties.set(&format!("phase_{}_{key}", phase.letter()), state);
        states.push(state);
    }
    states.windows(2).all(|pair| pair[0] == pair[1])
}

fn map_switching_device<'a>(
    ctx: &mut NetworkContext<'a>,
    row: Row<'a>,
    class: ObjectClass,
) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let link = placeholder(ctx, device_id)?;
    let closed = phase_column(&row, "ClosedPhase")?;
    let present = edge_phases(ctx, &link);

    let mut properties = Properties::new();
    let banked = phase_states(&mut properties, present, closed, "state", ["CLOSED", "OPEN"]);
    let mode = if banked { "BANKED" } else { "INDIVIDUAL" };
    properties.set("operating_mode", mode);

    let name = ctx.graph.upsert(
        ctx.names,
        class,
        &link,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    Ok(MapOutcome::Mapped(name))
}

/// `switch` rows.
pub fn map_switch<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    map_switching_device(ctx, row, ObjectClass::Switch)
}

/// `breaker` rows, which GridLAB-D models as switches.
pub fn map_breaker<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    map_switching_device(ctx, row, ObjectClass::Switch)
}

/// `recloser` rows.
pub fn map_recloser<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    map_switching_device(ctx, row, ObjectClass::Recloser)
}

/// `fuse` rows. Fuses report a status per phase and get an assumed current
/// limit.
pub fn map_fuse<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let link = placeholder(ctx, device_id)?;
    let closed = phase_column(&row, "ClosedPhase")?;
    let present = edge_phases(ctx, &link);

    let mut properties = Properties::new();
    phase_states(&mut properties, present, closed, "status", ["GOOD", "BLOWN"]);
    let limit = format!("{:.1} A", ctx.config.defaults.fuse_current_limit);
    properties.set("current_limit", limit.as_str());

    let name = ctx.graph.upsert(
        ctx.names,
        ObjectClass::Fuse,
        &link,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    ctx.assume(
        &name,
        "current_limit",
        limit,
        format!("fuse '{device_id}' does not specify a current limit"),
    );
    Ok(MapOutcome::Mapped(name))
}
