//! Voltage regulators.

use cyme_core::{CymeError, CymeResult, MergeMode, ObjectClass, Properties};
use cyme_io::Row;

use super::{placeholder, MapOutcome};
use crate::context::NetworkContext;

const CONNECT_TYPE: &str = "WYE_WYE";
const CONTROL: &str = "OUTPUT_VOLTAGE";
const BAND_CENTER: &str = "${GLM_NOMINAL_VOLTAGE}";

/// Map one `regulator` row onto its link placeholder. The sense node is the
/// link's to node.
pub fn map_regulator<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let link = placeholder(ctx, device_id)?;
    let equipment_id = row.str("EquipmentId")?;
    let equipment = ctx.equipment("eqregulator", equipment_id)?;

    let rated_kvln = equipment.f64("RatedKVLN")?;
    if rated_kvln == 0.0 {
        return Err(CymeError::ZeroRating {
            device: device_id.to_string(),
            rating: "kV rating".to_string(),
        });
    }
    let taps = equipment.i64("NumberOfTaps")?;
    let band_width = row.f64("BandWidth")?;
    let tap_positions = [
        row.opt_f64("TapPositionA")?.unwrap_or(0.0),
        row.opt_f64("TapPositionB")?.unwrap_or(0.0),
        row.opt_f64("TapPositionC")?.unwrap_or(0.0),
    ];

    let band = format!("{band_width:.1}V");
    let [tap_a, tap_b, tap_c] = tap_positions.map(|tap| format!("{tap:.0}"));
    let configuration = ctx.names.composite(
        &[
            equipment_id,
            band.as_str(),
            tap_a.as_str(),
            tap_b.as_str(),
            tap_c.as_str(),
        ],
        Some("regulator_configuration"),
    );
    let time_delay = ctx.config.defaults.regulator_time_delay.clone();

    if !ctx.graph.contains(&configuration) {
        let remark = |what: &str| format!("regulator '{device_id}' does not specify {what}");
        ctx.assume(&configuration, "connect_type", CONNECT_TYPE, remark("connection type"));
        ctx.assume(&configuration, "Control", CONTROL, remark("control type"));
        ctx.assume(&configuration, "time_delay", &time_delay, remark("time delay"));
        ctx.assume(&configuration, "band_center", BAND_CENTER, remark("band center"));
    }
    let properties = Properties::new()
        .with("connect_type", CONNECT_TYPE)
        .with("band_center", BAND_CENTER)
        .with("band_width", band)
        .with("time_delay", time_delay)
        .with("raise_taps", (taps / 2).to_string())
        .with("lower_taps", (taps / 2).to_string())
        .with(
            "regulation",
            format!("{:.1}%", band_width / (rated_kvln * 1000.0) * 100.0),
        )
        .with("tap_pos_A", tap_a)
        .with("tap_pos_B", tap_b)
        .with("tap_pos_C", tap_c)
        .with("Control", CONTROL);
    ctx.graph.upsert(
        ctx.names,
        ObjectClass::RegulatorConfiguration,
        &configuration,
        equipment_id,
        properties,
        MergeMode::Strict,
    )?;

    let sense_node = ctx
        .graph
        .get(&link)
        .and_then(|object| object.to_node())
        .map(str::to_string)
        .ok_or_else(|| CymeError::UnsupportedDevice {
            device: device_id.to_string(),
            reason: "link placeholder has no to node".to_string(),
        })?;
    let properties = Properties::new()
        .with("configuration", configuration)
        .with("sense_node", sense_node.as_str());
    let name = ctx.graph.upsert(
        ctx.names,
        ObjectClass::Regulator,
        &link,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    ctx.assume(
        &name,
        "sense_node",
        &sense_node,
        format!("regulator '{device_id}' does not specify sense node"),
    );
    Ok(MapOutcome::Mapped(name))
}
