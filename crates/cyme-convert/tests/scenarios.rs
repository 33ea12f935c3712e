//! End-to-end conversions of small in-memory networks.

use cyme_convert::{convert_network, run_store, ConvertConfig, ConvertedNetwork, RunOptions};
use cyme_core::{CymeError, NameRegistry, ObjectClass};
use cyme_io::exporters::export_to_glm_string;
use cyme_io::{GlmDocument, GlmMetadata, Table, TableStore};

const SECTION_COLUMNS: &[&str] = &["SectionId", "NetworkId", "FromNodeId", "ToNodeId", "Phase"];
const DEVICE_COLUMNS: &[&str] = &["DeviceNumber", "NetworkId", "SectionId", "DeviceType"];

/// A network table, head node N1 and nodes N1..=N{count} for every network.
fn base_tables(networks: &[&str], count: usize) -> Vec<Table> {
    let mut node_rows = Vec::new();
    for network in networks {
        for i in 1..=count {
            node_rows.push(vec![format!("N{i}"), network.to_string()]);
        }
    }
    vec![
        Table::from_rows(
            "network",
            vec!["NetworkId".into(), "Version".into()],
            networks
                .iter()
                .map(|id| vec![id.to_string(), "5020".to_string()])
                .collect(),
        ),
        Table::from_rows(
            "headnode",
            vec!["NodeId".into(), "NetworkId".into()],
            networks
                .iter()
                .map(|id| vec!["N1".to_string(), id.to_string()])
                .collect(),
        ),
        Table::from_rows(
            "node",
            vec!["NodeId".into(), "NetworkId".into()],
            node_rows,
        ),
    ]
}

fn line_equipment() -> Vec<Table> {
    vec![
        Table::from_str_rows(
            "eqconductor",
            &["EquipmentId", "GMR", "R25", "Diameter", "NominalRating"],
            &[&["336", "0.7", "0.19", "1.8", "530"]],
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
    ]
}

fn overhead_lines(rows: &[&[&str]]) -> Table {
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
        rows,
    )
}

fn config() -> ConvertConfig {
    ConvertConfig {
        nominal_voltage: Some("2.40178 kV".to_string()),
        ..ConvertConfig::default()
    }
}

fn convert(store: &TableStore, network: &str) -> Result<ConvertedNetwork, CymeError> {
    let mut names = NameRegistry::new();
    convert_network(store, &config(), &mut names, network)
}

fn single_switch() -> TableStore {
    let mut tables = base_tables(&["F1"], 2);
    tables.extend([
        Table::from_str_rows("section", SECTION_COLUMNS, &[&["S1", "F1", "N1", "N2", "1"]]),
        Table::from_str_rows("sectiondevice", DEVICE_COLUMNS, &[&["SW1", "F1", "S1", "13"]]),
        Table::from_str_rows(
            "switch",
            &["DeviceNumber", "NetworkId", "ClosedPhase"],
            &[&["SW1", "F1", "1"]],
        ),
    ]);
    TableStore::from_tables(tables)
}

#[test]
fn single_switch_network() {
    let converted = convert(&single_switch(), "F1").unwrap();
    let objects = &converted.objects;

    let head = objects.get("ND_N1").unwrap();
    assert_eq!(head.get("bustype"), Some("SWING"));
    assert_eq!(head.get("phases"), Some("AN"));
    assert_eq!(objects.get("ND_N2").unwrap().get("bustype"), Some("PQ"));

    let switch = objects.get("SW_SW1").unwrap();
    assert_eq!(switch.get("phase_A_state"), Some("CLOSED"));
    assert_eq!(switch.from_node(), Some("ND_N1"));
    assert_eq!(switch.to_node(), Some("ND_N2"));

    assert!(objects.iter().all(|o| o.class != ObjectClass::Link));
    assert_eq!(converted.stats.object_count(), 3);
    assert_eq!(converted.stats.mapped_devices, 1);
    assert_eq!(converted.diagnostics.warning_count(), 0);
}

#[test]
fn switch_wins_over_parallel_line() {
    let mut tables = base_tables(&["F1"], 2);
    tables.extend(line_equipment());
    tables.extend([
        Table::from_str_rows(
            "section",
            SECTION_COLUMNS,
            &[&["S1", "F1", "N1", "N2", "7"], &["S2", "F1", "N1", "N2", "7"]],
        ),
        Table::from_str_rows(
            "sectiondevice",
            DEVICE_COLUMNS,
            &[&["SW1", "F1", "S1", "13"], &["L1", "F1", "S2", "3"]],
        ),
        Table::from_str_rows(
            "switch",
            &["DeviceNumber", "NetworkId", "ClosedPhase"],
            &[&["SW1", "F1", "7"]],
        ),
        overhead_lines(&[&["L1", "F1", "100", "336", "336", "336", "336", "SP1"]]),
    ]);
    let converted = convert(&TableStore::from_tables(tables), "F1").unwrap();

    assert!(converted.objects.contains("SW_SW1"));
    assert!(!converted.objects.contains("OL_L1"));
    assert_eq!(converted.stats.removed_duplicates, 1);
    assert_eq!(converted.stats.class_count("overhead_line"), 0);
    assert_eq!(converted.stats.class_count("switch"), 1);
}

#[test]
fn parallel_lines_fail_only_their_network() {
    let mut tables = base_tables(&["F1", "F2"], 2);
    tables.extend(line_equipment());
    tables.extend([
        Table::from_str_rows(
            "section",
            SECTION_COLUMNS,
            &[
                &["S1", "F1", "N1", "N2", "7"],
                &["S2", "F1", "N1", "N2", "7"],
                &["S3", "F2", "N1", "N2", "7"],
            ],
        ),
        Table::from_str_rows(
            "sectiondevice",
            DEVICE_COLUMNS,
            &[
                &["L1", "F1", "S1", "3"],
                &["L2", "F1", "S2", "3"],
                &["SW3", "F2", "S3", "13"],
            ],
        ),
        Table::from_str_rows(
            "switch",
            &["DeviceNumber", "NetworkId", "ClosedPhase"],
            &[&["SW3", "F2", "7"]],
        ),
        overhead_lines(&[
            &["L1", "F1", "100", "336", "336", "336", "336", "SP1"],
            &["L2", "F1", "120", "336", "336", "336", "336", "SP1"],
        ]),
    ]);
    let store = TableStore::from_tables(tables);

    let err = convert(&store, "F1").unwrap_err();
    assert!(matches!(err, CymeError::UnsupportedDuplicateTopology { .. }));

    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions::new(dir.path(), dir.path());
    let summary = run_store(&store, "db", &options, config()).unwrap();
    assert_eq!(summary.processed(), 2);
    assert_eq!(summary.converted(), 1);
    assert_eq!(summary.error_count(), 1);
    assert_eq!(
        summary
            .diagnostics
            .issues_by_category("duplicate_topology")
            .count(),
        1
    );
    assert!(dir.path().join("db_F2.glm").exists());
    assert!(!dir.path().join("db_F1.glm").exists());
}

fn transformer_network(xr_ratio: &str, rating: &str) -> TableStore {
    let mut tables = base_tables(&["F1"], 3);
    tables.extend([
        Table::from_str_rows(
            "section",
            SECTION_COLUMNS,
            &[&["S1", "F1", "N1", "N2", "7"], &["S2", "F1", "N2", "N3", "7"]],
        ),
        Table::from_str_rows(
            "sectiondevice",
            DEVICE_COLUMNS,
            &[&["SW1", "F1", "S1", "13"], &["T1", "F1", "S2", "5"]],
        ),
        Table::from_str_rows(
            "switch",
            &["DeviceNumber", "NetworkId", "ClosedPhase"],
            &[&["SW1", "F1", "7"]],
        ),
        Table::from_str_rows(
            "transformer",
            &["DeviceNumber", "NetworkId", "EquipmentId"],
            &[&["T1", "F1", "XF1"]],
        ),
        Table::from_str_rows(
            "eqtransformer",
            &[
                "EquipmentId",
                "NominalRatingKVA",
                "PrimaryVoltageKVLL",
                "SecondaryVoltageKVLL",
                "PosSeqImpedancePercent",
                "XRRatio",
            ],
            &[&["XF1", rating, "12.47", "0.48", "5", xr_ratio]],
        ),
    ]);
    TableStore::from_tables(tables)
}

#[test]
fn zero_xr_ratio_records_one_assumption() {
    let converted = convert(&transformer_network("0", "500"), "F1").unwrap();
    let transformer = converted.objects.get("TF_T1").unwrap();
    let configuration = transformer.get("configuration").unwrap();

    let recorded: Vec<_> = converted.assumptions.iter().collect();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].object, configuration);
    assert_eq!(recorded[0].property, "impedance");
    assert_eq!(converted.stats.assumptions, 1);
}

#[test]
fn skipped_device_link_becomes_parent() {
    let converted = convert(&transformer_network("3", "0"), "F1").unwrap();
    let objects = &converted.objects;

    assert!(!objects.contains("TF_T1"));
    assert_eq!(objects.get("ND_N3").unwrap().parent(), Some("ND_N2"));
    assert_eq!(converted.stats.collapsed_links, 1);
    assert_eq!(converted.stats.skipped_devices, 1);
    assert_eq!(
        converted.diagnostics.issues_by_category("zero_rating").count(),
        1
    );
    assert!(objects.iter().all(|o| o.class != ObjectClass::Link));
}

#[test]
fn spot_load_attaches_to_from_node() {
    let mut tables = base_tables(&["F1"], 3);
    tables.extend([
        Table::from_str_rows(
            "section",
            SECTION_COLUMNS,
            &[&["S1", "F1", "N1", "N2", "7"], &["S2", "F1", "N2", "N3", "7"]],
        ),
        Table::from_str_rows(
            "sectiondevice",
            DEVICE_COLUMNS,
            &[&["SW1", "F1", "S1", "13"], &["LD1", "F1", "S2", "20"]],
        ),
        Table::from_str_rows(
            "switch",
            &["DeviceNumber", "NetworkId", "ClosedPhase"],
            &[&["SW1", "F1", "7"]],
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
                &["LD1", "F1", "2", "PQ", "10", "5"],
            ],
        ),
        Table::from_str_rows(
            "load",
            &["DeviceNumber", "NetworkId", "ConnectionConfiguration"],
            &[&["LD1", "F1", "0"]],
        ),
    ]);
    let converted = convert(&TableStore::from_tables(tables), "F1").unwrap();

    let load = converted.objects.get("LD_LD1").unwrap();
    assert_eq!(load.parent(), Some("ND_N2"));
    assert_eq!(load.get("phases"), Some("AB"));
    assert!(load.get("constant_power_A").is_some());
    assert!(load.get("constant_power_B").is_some());
    assert!(!converted.objects.contains("LK_LD1"));
    assert_eq!(converted.stats.class_count("load"), 1);
}

#[test]
fn conversion_is_deterministic() {
    let store = transformer_network("0", "500");
    let first = convert(&store, "F1").unwrap();
    let second = convert(&store, "F1").unwrap();

    let metadata = GlmMetadata::new("db", "F1");
    let render = |converted: &ConvertedNetwork| {
        let mut doc = GlmDocument::new(metadata.clone(), &converted.objects);
        doc.assumptions = Some(&converted.assumptions);
        export_to_glm_string(&doc).unwrap()
    };
    assert_eq!(render(&first), render(&second));
}

#[test]
fn node_phases_do_not_depend_on_section_order() {
    let build = |sections: &[&[&str]]| {
        let mut tables = base_tables(&["F1"], 3);
        tables.extend([
            Table::from_str_rows("section", SECTION_COLUMNS, sections),
            Table::from_str_rows(
                "sectiondevice",
                DEVICE_COLUMNS,
                &[&["SW1", "F1", "S1", "13"], &["SW2", "F1", "S2", "13"]],
            ),
            Table::from_str_rows(
                "switch",
                &["DeviceNumber", "NetworkId", "ClosedPhase"],
                &[&["SW1", "F1", "7"], &["SW2", "F1", "7"]],
            ),
        ]);
        TableStore::from_tables(tables)
    };
    let forward = build(&[&["S1", "F1", "N1", "N2", "1"], &["S2", "F1", "N2", "N3", "2"]]);
    let reverse = build(&[&["S2", "F1", "N2", "N3", "2"], &["S1", "F1", "N1", "N2", "1"]]);

    let a = convert(&forward, "F1").unwrap();
    let b = convert(&reverse, "F1").unwrap();
    for node in ["ND_N1", "ND_N2", "ND_N3"] {
        assert_eq!(
            a.objects.get(node).unwrap().get("phases"),
            b.objects.get(node).unwrap().get("phases"),
        );
    }
    assert_eq!(a.objects.get("ND_N2").unwrap().get("phases"), Some("ABN"));
}
