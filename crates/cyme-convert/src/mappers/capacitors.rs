//! Shunt capacitors.

use cyme_core::units::format_g;
use cyme_core::{CymeError, CymeResult, MergeMode, ObjectClass, Phase, PhaseSet, Properties};
use cyme_io::Row;

use super::MapOutcome;
use crate::context::NetworkContext;
use crate::resolver::ensure_node;

/// Map one `shuntcapacitor` row onto the from node of its section. The phase
/// is taken from the row when given, otherwise from the phases with a
/// nonzero rating.
pub fn map_shunt_capacitor<'a>(
    ctx: &mut NetworkContext<'a>,
    row: Row<'a>,
) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let ratings = [
        (Phase::A, row.opt_f64("KVARA")?.unwrap_or(0.0)),
        (Phase::B, row.opt_f64("KVARB")?.unwrap_or(0.0)),
        (Phase::C, row.opt_f64("KVARC")?.unwrap_or(0.0)),
    ];
    if ratings.iter().all(|(_, kvar)| *kvar == 0.0) {
        return Err(CymeError::ZeroRating {
            device: device_id.to_string(),
            rating: "kVAR rating".to_string(),
        });
    }
    let phases = match row.opt_i64("Phase")? {
        Some(code) if code != 0 => PhaseSet::from_cyme_code(code).ok_or_else(|| {
            CymeError::Field {
                table: row.table().name().to_string(),
                id: device_id.to_string(),
                column: "Phase".to_string(),
                reason: format!("'{code}' is not a CYME phase code"),
            }
        })?,
        _ => ratings
            .iter()
            .filter(|(_, kvar)| *kvar != 0.0)
            .map(|(phase, _)| PhaseSet::from(*phase))
            .collect(),
    };
    let kvln = row.f64("KVLN")?;

    let (_, section) = ctx.device_section(device_id)?;
    let parent = ctx.node_name(section.str("FromNodeId")?);
    ensure_node(ctx, &parent, phases, device_id)?;
    let link = ctx.link_name(device_id);
    ctx.graph.delete(&link);

    let name = ctx.names.name(device_id, Some("capacitor"));
    let mut properties = Properties::new()
        .with("parent", parent.as_str())
        .with("nominal_voltage", format!("{} kV", format_g(kvln, 6)))
        .with("phases", phases.letters())
        .with("phases_connected", phases.letters());
    for (phase, kvar) in ratings {
        let letter = phase.letter();
        // only connected phases carry a rating
        let kvar = if phases.contains(phase) { kvar } else { 0.0 };
        properties.set(
            &format!("capacitor_{letter}"),
            format!("{} kVAr", format_g(kvar, 6)),
        );
        let switch = format!("switch{letter}");
        if kvar == 0.0 {
            properties.set(&switch, "OPEN");
        } else {
            properties.set(&switch, "CLOSED");
            ctx.assume(
                &name,
                &switch,
                "CLOSED",
                format!(
                    "capacitor {device_id} does not specify switch {letter} position, \
                     valid options are 'CLOSED' or 'OPEN'"
                ),
            );
        }
    }
    properties.set("control", "MANUAL");
    ctx.assume(
        &name,
        "control",
        "MANUAL",
        format!(
            "capacitor {device_id} does not specify a control strategy, valid options are \
             'CURRENT', 'VARVOLT', 'VOLT', 'VAR', or 'MANUAL'"
        ),
    );

    let name = ctx.graph.upsert(
        ctx.names,
        ObjectClass::Capacitor,
        &name,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    Ok(MapOutcome::Mapped(name))
}
