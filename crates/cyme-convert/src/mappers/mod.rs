//! Device mappers.
//!
//! Each mapper turns one CYME device record into GLM objects. Mappers return
//! a [`MapOutcome`] for records they deliberately leave out and an error for
//! records they cannot map; [`map_table`] downgrades device-level errors to
//! warnings so one bad record never fails the network.

pub mod capacitors;
pub mod lines;
pub mod links;
pub mod loads;
pub mod regulators;
pub mod switches;
pub mod transformers;

use cyme_core::{CymeError, CymeResult, ObjectClass, PhaseSet};
use cyme_io::Row;
use tracing::debug;

use crate::context::NetworkContext;

/// Result of mapping one device record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutcome {
    /// Name of the object the device became
    Mapped(String),
    /// The device was left out on purpose
    Skipped(String),
}

/// CYME device type names, indexed by device type code.
const CYME_DEVICES: [&str; 48] = [
    "UndergroundLine",
    "OverheadLine",
    "OverheadByPhase",
    "Regulator",
    "Transformer",
    "Not used",
    "Not used",
    "Breaker",
    "LVCB",
    "Recloser",
    "Not used",
    "Sectionalizer",
    "Switch",
    "Fuse",
    "SeriesCapacitor",
    "SeriesReactor",
    "ShuntCapacitor",
    "ShuntReactor",
    "Not used",
    "SpotLoad",
    "DistributedLoad",
    "Miscellaneous",
    "OverheadLineUnbalanced",
    "ArcFurnace",
    "CTypeFilter",
    "DoubleTunedFilter",
    "HighPassFilter",
    "IdealConverter",
    "NonIdealConverter",
    "ShuntFrequencySource",
    "Not used",
    "SingleTunedFilter",
    "InductionMotor",
    "SynchronousMotor",
    "InductionGenerator",
    "SynchronousGenerator",
    "ElectronicConverterGenerator",
    "TransformerByPhase",
    "ThreeWindingTransformer",
    "NetworkEquivalent",
    "Wecs",
    "GroundingTransformer",
    "MicroTurbine",
    "Sofc",
    "Photovoltaic",
    "SeriesFrequencySource",
    "AutoTransformer",
    "ThreeWindingAutoTransformer",
];

pub const SPOT_LOAD: i64 = 20;
pub const DISTRIBUTED_LOAD: i64 = 21;

/// Human-readable CYME name of a device type code.
pub fn cyme_device_name(device_type: i64) -> String {
    usize::try_from(device_type)
        .ok()
        .and_then(|code| code.checked_sub(1))
        .and_then(|idx| CYME_DEVICES.get(idx))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("device type {device_type}"))
}

/// GLM class a CYME device type becomes, if it has one.
pub fn glm_class(device_type: i64) -> Option<ObjectClass> {
    match device_type {
        1 => Some(ObjectClass::UndergroundLine),
        2 | 3 | 23 => Some(ObjectClass::OverheadLine),
        4 => Some(ObjectClass::Regulator),
        5 => Some(ObjectClass::Transformer),
        8 | 13 => Some(ObjectClass::Switch),
        10 => Some(ObjectClass::Recloser),
        14 => Some(ObjectClass::Fuse),
        17 => Some(ObjectClass::Capacitor),
        SPOT_LOAD | DISTRIBUTED_LOAD => Some(ObjectClass::Load),
        _ => None,
    }
}

/// Run `map` over every row of `table` in the current network.
///
/// A missing table skips the category with a warning. Device-level errors
/// and skips are recorded as warnings; any other error is returned and fails
/// the network.
pub fn map_table<'a, F>(
    ctx: &mut NetworkContext<'a>,
    table: &str,
    category: &str,
    mut map: F,
) -> CymeResult<()>
where
    F: FnMut(&mut NetworkContext<'a>, Row<'a>) -> CymeResult<MapOutcome>,
{
    let rows = match ctx.network_rows(table) {
        Ok(rows) => rows,
        Err(err @ CymeError::MissingTable(_)) => {
            ctx.warn(err.category(), &format!("{err}, {category} devices skipped"), table);
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    for row in rows {
        let id = row.id().to_string();
        match map(ctx, row) {
            Ok(MapOutcome::Mapped(name)) => {
                ctx.stats.mapped_devices += 1;
                debug!(network = %ctx.network_id, device = %id, object = %name, "mapped {category}");
            }
            Ok(MapOutcome::Skipped(reason)) => {
                ctx.stats.skipped_devices += 1;
                ctx.warn(category, &format!("{category} '{id}' skipped: {reason}"), &id);
            }
            Err(err) if err.is_device_level() => {
                ctx.stats.skipped_devices += 1;
                let message = format!("unable to add {category} '{id}': {err}");
                ctx.warn(err.category(), &message, &id);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Phase set of a device row, from a CYME phase code column.
pub(crate) fn phase_column(row: &Row<'_>, column: &str) -> CymeResult<PhaseSet> {
    let code = row.i64(column)?;
    PhaseSet::from_cyme_code(code).ok_or_else(|| CymeError::Field {
        table: row.table().name().to_string(),
        id: row.id().to_string(),
        column: column.to_string(),
        reason: format!("'{code}' is not a CYME phase code"),
    })
}

/// Name of the link placeholder created for an edge device. Devices that no
/// section places on the network have none and cannot be mapped.
pub(crate) fn placeholder(ctx: &mut NetworkContext<'_>, device_id: &str) -> CymeResult<String> {
    let link = ctx.link_name(device_id);
    if ctx.graph.contains(&link) {
        Ok(link)
    } else {
        Err(CymeError::UnsupportedDevice {
            device: device_id.to_string(),
            reason: "no section device places it on a section".to_string(),
        })
    }
}

/// Live phases of an existing edge object.
pub(crate) fn edge_phases(ctx: &NetworkContext<'_>, name: &str) -> PhaseSet {
    ctx.graph
        .get(name)
        .and_then(|object| object.get("phases"))
        .and_then(PhaseSet::parse)
        .map(PhaseSet::live)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_names() {
        assert_eq!(cyme_device_name(1), "UndergroundLine");
        assert_eq!(cyme_device_name(17), "ShuntCapacitor");
        assert_eq!(cyme_device_name(48), "ThreeWindingAutoTransformer");
        assert_eq!(cyme_device_name(99), "device type 99");
        assert_eq!(cyme_device_name(0), "device type 0");
    }

    #[test]
    fn test_glm_classes() {
        assert_eq!(glm_class(23), Some(ObjectClass::OverheadLine));
        assert_eq!(glm_class(8), Some(ObjectClass::Switch));
        assert_eq!(glm_class(21), Some(ObjectClass::Load));
        assert_eq!(glm_class(45), None);
    }
}
