//! Conversion runs over CSV exports on disk.

use std::fs;
use std::path::Path;

use cyme_convert::{run, AssumptionsMode, ConvertConfig, RunOptions};

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

/// Export with one network: a switch from the head node and a transformer
/// without an X/R ratio.
fn export(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    write(
        dir,
        "CYMNETWORK.csv",
        "NetworkId,Version,CreationTime,LastChange,LoadFactor\nFEEDER1,5020,1600000000,1600000000,0.8\nOTHER,5020,,,\n",
    );
    write(dir, "CYMHEADNODE.csv", "NodeId,NetworkId\nN1,FEEDER1\n");
    write(
        dir,
        "CYMNODE.csv",
        "NodeId,NetworkId\nN1,FEEDER1\nN2,FEEDER1\nN3,FEEDER1\n",
    );
    write(
        dir,
        "CYMSECTION.csv",
        "SectionId,NetworkId,FromNodeId,ToNodeId,Phase\nS1,FEEDER1,N1,N2,7\nS2,FEEDER1,N2,N3,7\n",
    );
    write(
        dir,
        "CYMSECTIONDEVICE.csv",
        "DeviceNumber,NetworkId,SectionId,DeviceType\nSW1,FEEDER1,S1,13\nT1,FEEDER1,S2,5\n",
    );
    write(
        dir,
        "CYMSWITCH.csv",
        "DeviceNumber,NetworkId,ClosedPhase\nSW1,FEEDER1,7\n",
    );
    write(
        dir,
        "CYMTRANSFORMER.csv",
        "DeviceNumber,NetworkId,EquipmentId\nT1,FEEDER1,XF1\n",
    );
    write(
        dir,
        "CYMEQTRANSFORMER.csv",
        "EquipmentId,NominalRatingKVA,PrimaryVoltageKVLL,SecondaryVoltageKVLL,PosSeqImpedancePercent,XRRatio\nXF1,500,12.47,0.48,5,0\n",
    );
}

fn config(assumptions: AssumptionsMode) -> ConvertConfig {
    ConvertConfig {
        network_matches: "FEEDER".to_string(),
        nominal_voltage: Some("7.2 kV".to_string()),
        define: vec!["SOLUTIONDUMP=yes".to_string()],
        assumptions,
        ..ConvertConfig::default()
    }
}

#[test]
fn writes_model_with_inline_assumptions() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ieee13");
    export(&data);
    let out = dir.path().join("out");

    let summary = run(&RunOptions::new(&data, &out), config(AssumptionsMode::Include)).unwrap();
    assert_eq!(summary.processed(), 1);
    assert_eq!(summary.error_count(), 0);

    let glm = fs::read_to_string(out.join("ieee13_FEEDER1.glm")).unwrap();
    assert!(glm.contains("#define CYME_MDBNAME=ieee13\n"));
    assert!(glm.contains("#define CYME_CREATED=2020-09-13T12:26:40\n"));
    assert!(glm.contains("#define CYME_NETWORKID=FEEDER1\n"));
    assert!(glm.contains("#define SOLUTIONDUMP=yes\n"));
    assert!(glm.contains("#define GLM_NOMINAL_VOLTAGE=7.2 kV\n"));
    assert!(glm.contains("object switch\n{\n\tname \"SW_SW1\";"));
    assert!(glm.contains("object transformer\n{\n\tname \"TF_T1\";"));
    assert!(glm.contains(".impedance \"0.000333+0.00222j\";"));
    assert!(!glm.contains("object link"));
    assert!(!out.join("ieee13_OTHER.glm").exists());
}

#[test]
fn warn_mode_writes_assumption_csv() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ieee13");
    export(&data);
    let out = dir.path().join("out");

    let summary = run(&RunOptions::new(&data, &out), config(AssumptionsMode::Warn)).unwrap();
    assert_eq!(
        summary.diagnostics.issues_by_category("assumptions").count(),
        1
    );

    let csv = fs::read_to_string(out.join("ieee13_FEEDER1_assumptions.csv")).unwrap();
    assert!(csv.starts_with("object_name,property_name,value,remark\n"));
    assert!(csv.contains("impedance"));
    let glm = fs::read_to_string(out.join("ieee13_FEEDER1.glm")).unwrap();
    assert!(!glm.contains("// Assumptions"));
}

#[test]
fn save_mode_and_network_map() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ieee13");
    export(&data);
    let out = dir.path().join("out");
    let mut options = RunOptions::new(&data, &out);
    options.dot = true;
    let mut config = config(AssumptionsMode::Save);
    config.network_prefix = "T_".to_string();

    run(&options, config).unwrap();
    assert!(out.join("T_ieee13_FEEDER1.glm").exists());
    assert!(out.join("T_ieee13_FEEDER1.dot").exists());
    let saved = fs::read_to_string(out.join("T_ieee13_FEEDER1_assumptions.glm")).unwrap();
    assert!(saved.contains("modify TC_"));
}

#[test]
fn modifications_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("ieee13");
    export(&data);
    write(dir.path(), "mods.csv", "ND_N2,nominal_voltage,7200\nbroken,row\n");
    let out = dir.path().join("out");
    let mut options = RunOptions::new(&data, &out);
    options.input_dir = dir.path().to_path_buf();
    let mut config = config(AssumptionsMode::Ignore);
    config.modify = vec!["mods.csv".to_string()];

    let summary = run(&options, config).unwrap();
    assert_eq!(summary.diagnostics.issues_by_category("modify").count(), 1);
    let glm = fs::read_to_string(out.join("ieee13_FEEDER1.glm")).unwrap();
    assert!(glm.contains("modify ND_N2.nominal_voltage \"7200\";\n"));
    assert!(!glm.contains(".impedance"));
}

#[test]
fn missing_core_table_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("broken");
    export(&data);
    fs::remove_file(data.join("CYMSECTION.csv")).unwrap();

    let err = run(
        &RunOptions::new(&data, dir.path().join("out")),
        config(AssumptionsMode::Include),
    )
    .unwrap_err();
    assert!(err.to_string().contains("section"));
}
