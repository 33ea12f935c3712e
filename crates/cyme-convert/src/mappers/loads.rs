//! Customer loads.
//!
//! A load's declared demand `P + jQ` (kW, kVAR) is spread over its live
//! phases and expressed in the form its consumer class asks for:
//!
//! | class | property | value |
//! |-------|----------|-------|
//! | `Z`   | `constant_impedance_X` | `(|V|·g)² / S` |
//! | `I`   | `constant_current_X` | `S / (V·g)` |
//! | `PQ`  | `constant_power_X` | `conj(S)` |
//!
//! `V` is the phase voltage reference: `(1 − k)·120°` for phase `k` of a wye
//! load, rotated by a further 30° with gain `g = √3` for a delta load.
//! `PV`, `SWING` and `SWINGPQ` classes become load bus types with a constant
//! impedance.

use std::f64::consts::PI;

use cyme_core::units::{format_complex, Kilovolts};
use cyme_core::{CymeError, CymeResult, MergeMode, ObjectClass, Phase, PhaseSet, Properties};
use cyme_io::Row;
use num_complex::Complex64;

use super::{phase_column, MapOutcome, DISTRIBUTED_LOAD, SPOT_LOAD};
use crate::config::LoadScale;
use crate::context::NetworkContext;
use crate::resolver::ensure_node;

/// How a load is connected to its bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Wye,
    Delta,
}

impl Connection {
    /// Decode `load.ConnectionConfiguration`.
    pub fn from_cyme_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Connection::Wye),
            2 => Some(Connection::Delta),
            _ => None,
        }
    }

    pub fn gain(self) -> f64 {
        match self {
            Connection::Wye => 1.0,
            Connection::Delta => 3f64.sqrt(),
        }
    }
}

/// ZIP component a demand is expressed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadModel {
    Impedance,
    Current,
    Power,
}

impl LoadModel {
    pub fn property(self) -> &'static str {
        match self {
            LoadModel::Impedance => "constant_impedance",
            LoadModel::Current => "constant_current",
            LoadModel::Power => "constant_power",
        }
    }
}

/// Voltage reference of one phase, in volts, for a nominal voltage in kV.
pub fn phase_voltage(nominal_kv: f64, phase: Phase, connection: Connection) -> Complex64 {
    let k = f64::from(phase.sequence_number().unwrap_or(1));
    let mut angle = (1.0 - k) * 2.0 * PI / 3.0;
    if connection == Connection::Delta {
        angle += PI / 6.0;
    }
    Complex64::from_polar(Kilovolts(nominal_kv).volts(), angle)
}

/// Value of one load component for demand `power` (VA) at `voltage`.
pub fn load_value(
    model: LoadModel,
    power: Complex64,
    voltage: Complex64,
    connection: Connection,
) -> Complex64 {
    let gain = connection.gain();
    match model {
        LoadModel::Impedance => {
            let magnitude = voltage.norm() * gain;
            Complex64::new(magnitude * magnitude, 0.0) / power
        }
        LoadModel::Current => power / (voltage * gain),
        LoadModel::Power => power.conj(),
    }
}

/// Divisor applied to declared demand before it is assigned to each phase.
pub fn scale_divisor(rule: LoadScale, connection: Connection, phases: PhaseSet) -> f64 {
    let count = phases.live_count().max(1);
    match (rule, connection) {
        (LoadScale::None, _) => 1.0,
        (LoadScale::ByConnection, Connection::Wye) => count as f64,
        (LoadScale::ByConnection, Connection::Delta) if count == 1 => 1.0,
        (LoadScale::ByConnection, Connection::Delta) => 3.0,
    }
}

fn connection(ctx: &mut NetworkContext<'_>, device_id: &str) -> CymeResult<Connection> {
    let code = match ctx.network_row("load", "DeviceNumber", device_id) {
        Ok(row) => row.opt_i64("ConnectionConfiguration")?,
        Err(CymeError::MissingTable(_) | CymeError::NotFound { .. }) => None,
        Err(err) => return Err(err),
    };
    match code {
        Some(code) => Connection::from_cyme_code(code).ok_or_else(|| {
            CymeError::UnsupportedDevice {
                device: device_id.to_string(),
                reason: format!("load connection configuration {code} is not supported"),
            }
        }),
        None => {
            ctx.warn(
                "load",
                &format!("load '{device_id}' does not specify a connection, wye assumed"),
                device_id,
            );
            Ok(Connection::Wye)
        }
    }
}

/// Map one `customerload` row. Rows of the same device on other phases merge
/// into the same load object.
pub fn map_customer_load<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    let device_id = row.id();
    let phases = phase_column(&row, "Phase")?.live();
    let (device, section) = ctx.device_section(device_id)?;
    let parent_id = match device.i64("DeviceType")? {
        SPOT_LOAD => section.str("FromNodeId")?,
        DISTRIBUTED_LOAD => section.str("ToNodeId")?,
        other => {
            return Err(CymeError::UnsupportedDevice {
                device: device_id.to_string(),
                reason: format!("CYME device type {other} is not a load"),
            })
        }
    };
    let connection = connection(ctx, device_id)?;

    let class = row.str("ConsumerClassId")?;
    let (model, bustype) = match class {
        "Z" => (LoadModel::Impedance, None),
        "I" => (LoadModel::Current, None),
        "PQ" => (LoadModel::Power, None),
        "PV" | "SWING" | "SWINGPQ" => (LoadModel::Impedance, Some(class)),
        other => {
            return Ok(MapOutcome::Skipped(format!(
                "consumer class '{other}' is not a supported load type"
            )))
        }
    };

    let demand = Complex64::new(row.f64("LoadValue1")?, row.f64("LoadValue2")?) * 1000.0;
    if demand.norm() == 0.0 {
        return Err(CymeError::ZeroRating {
            device: device_id.to_string(),
            rating: "demand".to_string(),
        });
    }
    let nominal_kv = match (model, ctx.config.nominal_kv()) {
        (LoadModel::Power, kv) => kv.unwrap_or(1.0),
        (_, Some(kv)) => kv,
        (_, None) => {
            return Err(CymeError::UnsupportedDevice {
                device: device_id.to_string(),
                reason: "impedance and current loads need a configured nominal_voltage"
                    .to_string(),
            })
        }
    };

    let parent = ctx.node_name(parent_id);
    ensure_node(ctx, &parent, phases, device_id)?;
    let link = ctx.link_name(device_id);
    ctx.graph.delete(&link);

    let name = ctx.names.name(device_id, Some("load"));
    let existing = ctx
        .graph
        .get(&name)
        .and_then(|load| load.get("phases"))
        .and_then(PhaseSet::parse)
        .unwrap_or_default();

    let divisor = scale_divisor(ctx.config.load_scale, connection, phases);
    let mut properties = Properties::new()
        .with("parent", parent.as_str())
        .with("phases", (existing | phases).letters())
        .with("nominal_voltage", "${GLM_NOMINAL_VOLTAGE}");
    if let Some(bustype) = bustype {
        properties.set("bustype", bustype);
    }
    for phase in phases.live_phases() {
        let voltage = phase_voltage(nominal_kv, phase, connection);
        let value = load_value(model, demand / divisor, voltage, connection);
        properties.set(
            &format!("{}_{}", model.property(), phase.letter()),
            format_complex(value.re, -value.im, 4),
        );
    }

    let name = ctx.graph.upsert(
        ctx.names,
        ObjectClass::Load,
        &name,
        device_id,
        properties,
        MergeMode::Overwrite,
    )?;
    Ok(MapOutcome::Mapped(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use crate::mappers::links::map_links;
    use crate::mappers::map_table;
    use cyme_core::NameRegistry;
    use cyme_io::{Table, TableStore};

    #[test]
    fn test_delta_reference_round_trip() {
        for phase in Phase::LIVE {
            let wye = phase_voltage(2.4, phase, Connection::Wye);
            let delta = phase_voltage(2.4, phase, Connection::Delta) * Connection::Delta.gain();
            assert!((delta.norm() - 2400.0 * 3f64.sqrt()).abs() < 1e-9);

            let back = delta / Connection::Delta.gain() * Complex64::from_polar(1.0, -PI / 6.0);
            assert!((back - wye).norm() < 1e-9);
            assert!((back.norm() - 2400.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wye_angles() {
        let b = phase_voltage(1.0, Phase::B, Connection::Wye);
        assert!((b.arg() + 2.0 * PI / 3.0).abs() < 1e-12);
        let c = phase_voltage(1.0, Phase::C, Connection::Wye);
        assert!((c.arg() - 2.0 * PI / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_values() {
        let power = Complex64::new(1000.0, 500.0);
        let v = phase_voltage(1.0, Phase::A, Connection::Wye);

        let pq = load_value(LoadModel::Power, power, v, Connection::Wye);
        assert_eq!(format_complex(pq.re, -pq.im, 4), "1000+500j");

        let z = load_value(LoadModel::Impedance, power, v, Connection::Wye);
        // |V|^2 / S = 1e6 / (1000 + 500j) = 800 - 400j, written with the sign flipped
        assert_eq!(format_complex(z.re, -z.im, 4), "800+400j");

        let i = load_value(LoadModel::Current, power, v, Connection::Wye);
        assert!((i - Complex64::new(1.0, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_scale_divisor() {
        let abc = PhaseSet::ABC;
        assert_eq!(scale_divisor(LoadScale::ByConnection, Connection::Wye, abc), 3.0);
        assert_eq!(scale_divisor(LoadScale::ByConnection, Connection::Wye, PhaseSet::B), 1.0);
        assert_eq!(scale_divisor(LoadScale::ByConnection, Connection::Delta, PhaseSet::A), 1.0);
        assert_eq!(scale_divisor(LoadScale::ByConnection, Connection::Delta, abc), 3.0);
        assert_eq!(scale_divisor(LoadScale::None, Connection::Wye, abc), 1.0);
    }

    fn store() -> TableStore {
        TableStore::from_tables([
            Table::from_str_rows(
                "section",
                &["SectionId", "NetworkId", "FromNodeId", "ToNodeId", "Phase"],
                &[&["S1", "F1", "N1", "N2", "7"]],
            ),
            Table::from_str_rows(
                "sectiondevice",
                &["DeviceNumber", "NetworkId", "SectionId", "DeviceType"],
                &[&["LD1", "F1", "S1", "20"]],
            ),
            Table::from_str_rows(
                "load",
                &["DeviceNumber", "NetworkId", "ConnectionConfiguration"],
                &[&["LD1", "F1", "0"]],
            ),
            Table::from_str_rows(
                "customerload",
                &[
                    "DeviceNumber",
                    "NetworkId",
                    "Phase",
                    "ConsumerClassId",
                    "LoadValue1",
                    "LoadValue2",
                ],
                &[
                    &["LD1", "F1", "1", "PQ", "10", "5"],
                    &["LD1", "F1", "3", "PQ", "20", "0"],
                ],
            ),
        ])
    }

    #[test]
    fn test_rows_merge_into_one_load() {
        let store = store();
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(&mut ctx, "customerload", "load", map_customer_load).unwrap();

        assert!(!ctx.graph.contains("LK_LD1"));
        let load = ctx.graph.get("LD_LD1").unwrap();
        assert_eq!(load.parent(), Some("ND_N1"));
        assert_eq!(load.get("phases"), Some("AC"));
        assert_eq!(load.get("constant_power_A"), Some("1e+04+5000j"));
        assert_eq!(load.get("constant_power_C"), Some("2e+04+0j"));
        // the spot load's parent did not exist yet
        assert!(ctx.graph.contains("ND_N1"));
        assert_eq!(ctx.stats.synthesized_nodes, 1);
    }

    #[test]
    fn test_impedance_load_needs_voltage() {
        let mut store = store();
        store.insert(Table::from_str_rows(
            "customerload",
            &[
                "DeviceNumber",
                "NetworkId",
                "Phase",
                "ConsumerClassId",
                "LoadValue1",
                "LoadValue2",
            ],
            &[&["LD1", "F1", "1", "Z", "10", "5"]],
        ));
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(&mut ctx, "customerload", "load", map_customer_load).unwrap();
        assert_eq!(ctx.stats.skipped_devices, 1);
        assert!(!ctx.graph.contains("LD_LD1"));
        assert!(ctx.graph.contains("LK_LD1"));
    }
}
