//! Overhead and underground lines with their conductor, spacing and
//! configuration library objects.
//!
//! Library objects are named from the identifiers they are built from, so a
//! configuration used by many lines is written once.

use cyme_core::units::{format_complex, Meters, METERS_PER_MILE};
use cyme_core::{CymeResult, MergeMode, ObjectClass, Properties};
use cyme_io::Row;
use num_complex::Complex64;

use super::{placeholder, MapOutcome};
use crate::context::NetworkContext;

const DEFAULT_CONDUCTOR_RATING: f64 = 1000.0;

const RATINGS: [&str; 4] = [
    "rating.summer.continuous",
    "rating.winter.continuous",
    "rating.summer.emergency",
    "rating.winter.emergency",
];

/// Library objects a line needs, resolved in full before any is written so a
/// skipped line leaves nothing behind.
#[derive(Default)]
struct Library {
    pending: Vec<Pending>,
}

struct Pending {
    class: ObjectClass,
    name: String,
    source_id: String,
    properties: Properties,
    /// Conductor whose ratings fall back to the default
    unrated: bool,
}

impl Library {
    fn has(&self, ctx: &NetworkContext<'_>, name: &str) -> bool {
        ctx.graph.contains(name) || self.pending.iter().any(|p| p.name == name)
    }

    fn add(
        &mut self,
        class: ObjectClass,
        name: &str,
        source_id: &str,
        properties: Properties,
    ) -> &mut Pending {
        self.pending.push(Pending {
            class,
            name: name.to_string(),
            source_id: source_id.to_string(),
            properties,
            unrated: false,
        });
        let last = self.pending.len() - 1;
        &mut self.pending[last]
    }

    fn commit(self, ctx: &mut NetworkContext<'_>) -> CymeResult<()> {
        for object in self.pending {
            if object.unrated {
                for property in RATINGS {
                    ctx.assume(
                        &object.name,
                        property,
                        format!("{DEFAULT_CONDUCTOR_RATING:.1} A"),
                        format!("conductor '{}' has no nominal rating", object.source_id),
                    );
                }
            }
            ctx.graph.upsert(
                ctx.names,
                object.class,
                &object.name,
                &object.source_id,
                object.properties,
                MergeMode::Overwrite,
            )?;
        }
        Ok(())
    }
}

/// Overhead line conductor from `eqconductor`.
fn conductor(ctx: &mut NetworkContext<'_>, library: &mut Library, id: &str) -> CymeResult<String> {
    let name = ctx.names.name(id, Some("overhead_line_conductor"));
    if library.has(ctx, &name) {
        return Ok(name);
    }
    let equipment = ctx.equipment("eqconductor", id)?;
    let gmr = equipment.f64("GMR")?;
    let r25 = equipment.f64("R25")?;
    let diameter = equipment.f64("Diameter")?;
    let nominal = equipment.opt_f64("NominalRating")?.unwrap_or(0.0);
    let rating = if nominal == 0.0 {
        DEFAULT_CONDUCTOR_RATING
    } else {
        nominal
    };

    let mut properties = Properties::new()
        .with("geometric_mean_radius", format!("{gmr:.2} cm"))
        .with("resistance", format!("{r25:.5} Ohm/km"))
        .with("diameter", format!("{diameter:.2} cm"));
    for property in RATINGS {
        properties.set(property, format!("{rating:.1} A"));
    }
    library
        .add(ObjectClass::OverheadLineConductor, &name, id, properties)
        .unrated = nominal == 0.0;
    Ok(name)
}

/// Line spacing from the conductor coordinates in `eqgeometricalarrangement`.
fn spacing(ctx: &mut NetworkContext<'_>, library: &mut Library, id: &str) -> CymeResult<String> {
    let name = ctx.names.name(id, Some("line_spacing"));
    if library.has(ctx, &name) {
        return Ok(name);
    }
    let equipment = ctx.equipment("eqgeometricalarrangement", id)?;
    let position = |prefix: &str| -> CymeResult<(f64, f64)> {
        Ok((
            equipment.f64(&format!("{prefix}_Horizontal"))?,
            equipment.f64(&format!("{prefix}_Vertical"))?,
        ))
    };
    let a = position("ConductorA")?;
    let b = position("ConductorB")?;
    let c = position("ConductorC")?;
    let n = position("NeutralConductor")?;

    let meters = |value: Meters| format!("{:.2} m", value.value());
    let properties = Properties::new()
        .with("distance_AB", meters(Meters::between(a, b)))
        .with("distance_AC", meters(Meters::between(a, c)))
        .with("distance_BC", meters(Meters::between(b, c)))
        .with("distance_AN", meters(Meters::between(a, n)))
        .with("distance_BN", meters(Meters::between(b, n)))
        .with("distance_CN", meters(Meters::between(c, n)))
        .with("distance_AE", meters(Meters(a.1)))
        .with("distance_BE", meters(Meters(b.1)))
        .with("distance_CE", meters(Meters(c.1)))
        .with("distance_NE", meters(Meters(n.1)));
    library.add(ObjectClass::LineSpacing, &name, id, properties);
    Ok(name)
}

/// Line configuration named after its conductors `[A, B, C, N]` and spacing.
fn configuration(
    ctx: &mut NetworkContext<'_>,
    library: &mut Library,
    name: Option<String>,
    conductors: [&str; 4],
    spacing_id: &str,
) -> CymeResult<String> {
    let name = match name {
        Some(name) => name,
        None => {
            let mut parts = conductors.to_vec();
            parts.push(spacing_id);
            ctx.names.composite(parts.as_slice(), Some("line_configuration"))
        }
    };
    if library.has(ctx, &name) {
        return Ok(name);
    }

    let mut properties = Properties::new();
    for (phase, id) in ["A", "B", "C", "N"].into_iter().zip(conductors) {
        let conductor = conductor(ctx, library, id)?;
        properties.set(&format!("conductor_{phase}"), conductor);
    }
    properties.set("spacing", spacing(ctx, library, spacing_id)?);
    library.add(ObjectClass::LineConfiguration, &name, spacing_id, properties);
    Ok(name)
}

/// Write the library and replace the link placeholder of `device_id` by a
/// line.
fn line(
    ctx: &mut NetworkContext<'_>,
    class: ObjectClass,
    device_id: &str,
    length: f64,
    configuration: String,
    library: Library,
) -> CymeResult<MapOutcome> {
    let link = placeholder(ctx, device_id)?;
    library.commit(ctx)?;
    let properties = Properties::new()
        .with("length", format!("{length:.2} m"))
        .with("configuration", configuration);
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

/// `overheadbyphase`: conductors and spacing given on the device itself.
pub fn map_overhead_by_phase<'a>(
    ctx: &mut NetworkContext<'a>,
    row: Row<'a>,
) -> CymeResult<MapOutcome> {
    placeholder(ctx, row.id())?;
    let length = row.f64("Length")?;
    let conductors = [
        row.str("PhaseConductorIdA")?,
        row.str("PhaseConductorIdB")?,
        row.str("PhaseConductorIdC")?,
        row.str("NeutralConductorId")?,
    ];
    let mut library = Library::default();
    let configuration = configuration(
        ctx,
        &mut library,
        None,
        conductors,
        row.str("ConductorSpacingId")?,
    )?;
    line(ctx, ObjectClass::OverheadLine, row.id(), length, configuration, library)
}

/// `overheadlineunbalanced`: conductors and spacing from the line equipment.
pub fn map_overhead_unbalanced<'a>(
    ctx: &mut NetworkContext<'a>,
    row: Row<'a>,
) -> CymeResult<MapOutcome> {
    placeholder(ctx, row.id())?;
    let length = row.f64("Length")?;
    let line_id = row.str("LineId")?;
    let name = ctx.names.name(line_id, Some("line_configuration"));
    let mut library = Library::default();
    let configuration = if ctx.graph.contains(&name) {
        name
    } else {
        let equipment = ctx.equipment("eqoverheadlineunbalanced", line_id)?;
        let conductors = [
            equipment.str("PhaseConductorIdA")?,
            equipment.str("PhaseConductorIdB")?,
            equipment.str("PhaseConductorIdC")?,
            equipment.str("NeutralConductorId")?,
        ];
        let spacing_id = equipment.str("ConductorSpacingId")?;
        configuration(ctx, &mut library, Some(name), conductors, spacing_id)?
    };
    line(ctx, ObjectClass::OverheadLine, row.id(), length, configuration, library)
}

/// `overheadline`: balanced line equipment with one phase conductor type.
pub fn map_overhead_balanced<'a>(
    ctx: &mut NetworkContext<'a>,
    row: Row<'a>,
) -> CymeResult<MapOutcome> {
    placeholder(ctx, row.id())?;
    let length = row.f64("Length")?;
    let equipment = ctx.equipment("eqoverheadline", row.str("LineId")?)?;
    let phase = equipment.str("PhaseConductorId")?;
    let conductors = [phase, phase, phase, equipment.str("NeutralConductorId")?];
    let mut library = Library::default();
    let configuration = configuration(
        ctx,
        &mut library,
        None,
        conductors,
        equipment.str("ConductorSpacingId")?,
    )?;
    line(ctx, ObjectClass::OverheadLine, row.id(), length, configuration, library)
}

/// Phase impedance matrix terms `(self, mutual)` in ohm per mile from
/// positive and zero sequence impedances in ohm per km.
pub fn phase_impedance(z1: Complex64, z0: Complex64) -> (Complex64, Complex64) {
    let per_mile = METERS_PER_MILE / 1000.0;
    let zs = (z0 + z1 * 2.0) / 3.0 * per_mile;
    let zm = (z0 - z1) / 3.0 * per_mile;
    (zs, zm)
}

/// `undergroundline`: cable sequence impedances turned into a phase
/// impedance matrix configuration.
pub fn map_underground<'a>(ctx: &mut NetworkContext<'a>, row: Row<'a>) -> CymeResult<MapOutcome> {
    placeholder(ctx, row.id())?;
    let length = row.f64("Length")?;
    let cable_id = row.str("CableId")?;
    let name = ctx
        .names
        .composite(&["UG", cable_id], Some("line_configuration"));
    let mut library = Library::default();
    if !ctx.graph.contains(&name) {
        let cable = ctx.equipment("eqcable", cable_id)?;
        let z1 = Complex64::new(
            cable.f64("PositiveSequenceResistance")?,
            cable.f64("PositiveSequenceReactance")?,
        );
        let z0 = Complex64::new(
            cable.f64("ZeroSequenceResistance")?,
            cable.f64("ZeroSequenceReactance")?,
        );
        let (zs, zm) = phase_impedance(z1, z0);
        let mut properties = Properties::new();
        for i in 1..=3 {
            for j in 1..=3 {
                let z = if i == j { zs } else { zm };
                properties.set(
                    &format!("z{i}{j}"),
                    format!("{} Ohm/mile", format_complex(z.re, z.im, 6)),
                );
            }
        }
        library.add(ObjectClass::LineConfiguration, &name, cable_id, properties);
    }
    line(ctx, ObjectClass::UndergroundLine, row.id(), length, name, library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use crate::mappers::links::map_links;
    use crate::mappers::map_table;
    use cyme_core::NameRegistry;
    use cyme_io::{Table, TableStore};

    fn store(extra: Vec<Table>) -> TableStore {
        let mut store = TableStore::from_tables([
            Table::from_str_rows(
                "section",
                &["SectionId", "NetworkId", "FromNodeId", "ToNodeId", "Phase"],
                &[&["S1", "F1", "N1", "N2", "7"], &["S2", "F1", "N2", "N3", "7"]],
            ),
            Table::from_str_rows(
                "sectiondevice",
                &["DeviceNumber", "NetworkId", "SectionId", "DeviceType"],
                &[&["L1", "F1", "S1", "3"], &["L2", "F1", "S2", "3"]],
            ),
            Table::from_str_rows(
                "eqconductor",
                &["EquipmentId", "GMR", "R25", "Diameter", "NominalRating"],
                &[&["336", "0.7", "0.19", "1.8", "530"], &["NONE", "0.1", "1", "0.5", "0"]],
            ),
            Table::from_str_rows(
                "eqgeometricalarrangement",
                &[
                    "EquipmentId",
                    "ConductorA_Horizontal",
                    "ConductorA_Vertical",
                    "ConductorB_Horizontal",
                    "ConductorB_Vertical",
                    "ConductorC_Horizontal",
                    "ConductorC_Vertical",
                    "NeutralConductor_Horizontal",
                    "NeutralConductor_Vertical",
                ],
                &[&["SP1", "0", "10", "3", "14", "6", "10", "3", "8"]],
            ),
        ]);
        for table in extra {
            store.insert(table);
        }
        store
    }

    #[test]
    fn test_overhead_by_phase_shares_configuration() {
        let store = store(vec![Table::from_str_rows(
            "overheadbyphase",
            &[
                "DeviceNumber",
                "NetworkId",
                "Length",
                "PhaseConductorIdA",
                "PhaseConductorIdB",
                "PhaseConductorIdC",
                "NeutralConductorId",
                "ConductorSpacingId",
            ],
            &[
                &["L1", "F1", "100", "336", "336", "336", "NONE", "SP1"],
                &["L2", "F1", "250.457", "336", "336", "336", "NONE", "SP1"],
            ],
        )]);
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(&mut ctx, "overheadbyphase", "overhead_line", map_overhead_by_phase).unwrap();

        let line = ctx.graph.get("OL_L2").unwrap();
        assert_eq!(line.class, ObjectClass::OverheadLine);
        assert_eq!(line.get("length"), Some("250.46 m"));
        assert_eq!(line.get("configuration"), Some("LC_336_336_336_NONE_SP1"));
        assert_eq!(line.from_node(), Some("ND_N2"));
        // placeholder name still reaches the line
        assert!(ctx.graph.contains("LK_L2"));

        assert_eq!(ctx.graph.class_counts().get("line_configuration"), Some(&1));
        let spacing = ctx.graph.get("LG_SP1").unwrap();
        assert_eq!(spacing.get("distance_AB"), Some("5.00 m"));
        assert_eq!(spacing.get("distance_AC"), Some("6.00 m"));
        assert_eq!(spacing.get("distance_NE"), Some("8.00 m"));

        let neutral = ctx.graph.get("OC_NONE").unwrap();
        assert_eq!(neutral.get("rating.summer.continuous"), Some("1000.0 A"));
        assert_eq!(ctx.assumptions.for_object("OC_NONE").count(), 4);
        assert_eq!(ctx.stats.mapped_devices, 2);
    }

    #[test]
    fn test_missing_equipment_skips_device() {
        let store = store(vec![
            Table::from_str_rows(
                "overheadlineunbalanced",
                &["DeviceNumber", "NetworkId", "Length", "LineId"],
                &[&["L1", "F1", "10", "MISSING"]],
            ),
            Table::from_str_rows(
                "eqoverheadlineunbalanced",
                &["EquipmentId", "PhaseConductorIdA"],
                &[],
            ),
        ]);
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(
            &mut ctx,
            "overheadlineunbalanced",
            "overhead_line",
            map_overhead_unbalanced,
        )
        .unwrap();

        assert_eq!(ctx.stats.skipped_devices, 1);
        assert_eq!(ctx.diag.issues_by_category("equipment").count(), 1);
        assert_eq!(ctx.graph.get("LK_L1").unwrap().class, ObjectClass::Link);
    }

    fn by_phase(length: &str, spacing: &str) -> Table {
        Table::from_str_rows(
            "overheadbyphase",
            &[
                "DeviceNumber",
                "NetworkId",
                "Length",
                "PhaseConductorIdA",
                "PhaseConductorIdB",
                "PhaseConductorIdC",
                "NeutralConductorId",
                "ConductorSpacingId",
            ],
            &[&["L1", "F1", length, "336", "336", "336", "NONE", spacing]],
        )
    }

    #[test]
    fn test_bad_length_writes_no_library_objects() {
        let store = store(vec![by_phase("n/a", "SP1")]);
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(&mut ctx, "overheadbyphase", "overhead_line", map_overhead_by_phase).unwrap();

        assert_eq!(ctx.stats.skipped_devices, 1);
        assert!(!ctx.graph.contains("OL_L1"));
        assert!(!ctx.graph.contains("LC_336_336_336_NONE_SP1"));
        assert!(!ctx.graph.contains("OC_336"));
        assert!(!ctx.graph.contains("OC_NONE"));
        assert!(!ctx.graph.contains("LG_SP1"));
        assert!(ctx.assumptions.is_empty());
    }

    #[test]
    fn test_missing_spacing_writes_no_conductors() {
        let store = store(vec![by_phase("100", "NOSUCH")]);
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        map_links(&mut ctx).unwrap();
        map_table(&mut ctx, "overheadbyphase", "overhead_line", map_overhead_by_phase).unwrap();

        assert_eq!(ctx.stats.skipped_devices, 1);
        assert_eq!(ctx.diag.issues_by_category("equipment").count(), 1);
        assert!(!ctx.graph.contains("OC_336"));
        assert!(!ctx.graph.contains("OC_NONE"));
        assert!(ctx.assumptions.is_empty());
        assert_eq!(ctx.graph.get("LK_L1").unwrap().class, ObjectClass::Link);
    }

    #[test]
    fn test_phase_impedance() {
        let z1 = Complex64::new(0.3, 0.6);
        let z0 = Complex64::new(0.9, 1.2);
        let (zs, zm) = phase_impedance(z1, z0);
        let per_mile = 1.609344;
        assert!((zs.re - 0.5 * per_mile).abs() < 1e-12);
        assert!((zs.im - 0.8 * per_mile).abs() < 1e-12);
        assert!((zm.re - 0.2 * per_mile).abs() < 1e-12);
        assert!((zm.im - 0.2 * per_mile).abs() < 1e-12);
        // the self term minus the mutual term is the positive sequence term
        let z1_back = (zs - zm) / per_mile;
        assert!((z1_back - z1).norm() < 1e-12);
    }
}
