//! Two-winding transformers and their configurations.

use cyme_core::units::{format_g, Kilovolts};
use cyme_core::{CymeError, CymeResult, MergeMode, ObjectClass, Properties, Value};
use cyme_io::Row;

use super::{edge_phases, placeholder, MapOutcome};
use crate::context::NetworkContext;

/// Per-unit impedance used when the equipment has no usable X/R ratio
pub const DEFAULT_RESISTANCE: f64 = 0.000333;
pub const DEFAULT_REACTANCE: f64 = 0.00222;

/// Series resistance and reactance (per unit) from the positive sequence
/// impedance in percent and the X/R ratio. `None` when either is zero.
pub fn series_impedance(impedance_percent: f64, xr_ratio: f64) -> Option<(f64, f64)> {
    let z = impedance_percent / 100.0;
    if z == 0.0 || xr_ratio == 0.0 {
        return None;
    }
    let r = z / (1.0 + xr_ratio * xr_ratio).sqrt();
    Some((r, r * xr_ratio))
}

fn kv_ln(kv_ll: f64) -> String {
    format!("{}kV", format_g(Kilovolts(kv_ll).line_to_neutral().value(), 6))
}

/// Map one `transformer` row onto its link placeholder.
pub fn map_transformer<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let link = placeholder(ctx, device_id)?;
    let equipment = ctx.equipment("eqtransformer", row.str("EquipmentId")?)?;

    let rating = equipment.f64("NominalRatingKVA")?;
    if rating == 0.0 {
        return Err(CymeError::ZeroRating {
            device: device_id.to_string(),
            rating: "kVA rating".to_string(),
        });
    }
    let primary_kv = equipment.f64("PrimaryVoltageKVLL")?;
    let secondary_kv = equipment.f64("SecondaryVoltageKVLL")?;
    let impedance = series_impedance(
        equipment.f64("PosSeqImpedancePercent")?,
        equipment.opt_f64("XRRatio")?.unwrap_or(0.0),
    );

    let (r, x) = impedance.unwrap_or((DEFAULT_RESISTANCE, DEFAULT_REACTANCE));
    let primary = kv_ln(primary_kv);
    let same_voltage = primary == kv_ln(secondary_kv);
    let secondary = if same_voltage {
        kv_ln(secondary_kv + 0.001)
    } else {
        kv_ln(secondary_kv)
    };
    let power_rating = format!("{}kVA", format_g(rating, 4));

    let configuration = ctx.names.composite(
        &[
            power_rating.clone(),
            primary.clone(),
            secondary.clone(),
            format!("R{}", format_g(r, 4)),
            format!("X{}", format_g(x, 4)),
        ],
        Some("transformer_configuration"),
    );
    if !ctx.graph.contains(&configuration) {
        if impedance.is_none() {
            ctx.assume(
                &configuration,
                "impedance",
                format!("{DEFAULT_RESISTANCE}+{DEFAULT_REACTANCE}j"),
                format!("transformer {device_id} impedance or XRRatio is zero"),
            );
        }
        if same_voltage {
            ctx.assume(
                &configuration,
                "secondary_voltage",
                &secondary,
                format!("transformer {device_id} primary voltage is the same as secondary voltage"),
            );
        }
    }
    let properties = Properties::new()
        .with("connect_type", ctx.config.defaults.transformer_connect_type.as_str())
        .with("install_type", ctx.config.defaults.transformer_install_type.as_str())
        .with("power_rating", power_rating)
        .with("primary_voltage", primary)
        .with("secondary_voltage", secondary)
        .with("resistance", r)
        .with("reactance", x);
    ctx.graph.upsert(
        ctx.names,
        ObjectClass::TransformerConfiguration,
        &configuration,
        device_id,
        properties,
        MergeMode::Strict,
    )?;

    let phases = edge_phases(ctx, &link).with_neutral();
    let properties = Properties::new()
        .with("nominal_voltage", Value::Unset)
        .with("phases", phases.letters())
        .with("configuration", configuration);
    let name = ctx.graph.upsert(
        ctx.names,
        ObjectClass::Transformer,
        &link,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    Ok(MapOutcome::Mapped(name))
}
