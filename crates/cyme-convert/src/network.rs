//! Network pipeline and run driver.
//!
//! [`convert_network`] builds the object graph of one network in memory;
//! [`run`] walks every selected network of a database export, converts it and
//! writes the GLM model and side artifacts.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use cyme_core::{
    topology_stats, Assumptions, ConversionStats, CymeError, CymeResult, Diagnostics,
    NameRegistry, ObjectGraph,
};
use cyme_io::exporters::{
    cyme_timestamp, export_assumptions_csv, export_assumptions_glm, export_to_dot, export_to_glm,
};
use cyme_io::importers::{read_modifications, ModificationSet};
use cyme_io::{GlmDocument, GlmMetadata, Row, TableStore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::check::final_check;
use crate::config::{AssumptionsMode, ConvertConfig};
use crate::context::{NetworkContext, RunContext};
use crate::mappers::{
    capacitors, lines, links, loads, map_table, regulators, switches, transformers, MapOutcome,
    DISTRIBUTED_LOAD, SPOT_LOAD,
};
use crate::{reducer, resolver};

/// Result of converting one network.
#[derive(Debug, Clone)]
pub struct ConvertedNetwork {
    pub network_id: String,
    pub objects: ObjectGraph,
    pub assumptions: Assumptions,
    pub stats: ConversionStats,
    pub diagnostics: Diagnostics,
}

/// Paths and switches of one conversion run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory holding the CSV export of one CYME database
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Directory modification files are resolved against
    pub input_dir: PathBuf,
    /// Also write a Graphviz network map per network
    pub dot: bool,
}

impl RunOptions {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            input_dir: PathBuf::from("."),
            dot: false,
        }
    }
}

/// Outcome of one network within a run.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub network_id: String,
    /// Written model; `None` when the network failed
    pub glm_path: Option<PathBuf>,
    pub stats: ConversionStats,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub networks: Vec<NetworkSummary>,
    pub diagnostics: Diagnostics,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.networks.len()
    }

    pub fn converted(&self) -> usize {
        self.networks.iter().filter(|n| n.glm_path.is_some()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.warning_count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

/// Device types each mapped table holds. A table that is absent is only
/// worth a warning when the network places devices of these types.
const DEVICE_TABLES: &[(&str, &str, &[i64])] = &[
    ("overheadbyphase", "overhead_line", &[3]),
    ("overheadlineunbalanced", "overhead_line", &[23]),
    ("overheadline", "overhead_line", &[2]),
    ("undergroundline", "underground_line", &[1]),
    ("customerload", "load", &[SPOT_LOAD, DISTRIBUTED_LOAD]),
    ("transformer", "transformer", &[5]),
    ("regulator", "regulator", &[4]),
    ("shuntcapacitor", "capacitor", &[17]),
    ("switch", "switch", &[13]),
    ("breaker", "breaker", &[8]),
    ("recloser", "recloser", &[10]),
    ("fuse", "fuse", &[14]),
];

type Mapper = for<'a> fn(&mut NetworkContext<'a>, Row<'a>) -> CymeResult<MapOutcome>;

fn mapper(table: &str) -> Option<Mapper> {
    let map: Mapper = match table {
        "overheadbyphase" => lines::map_overhead_by_phase,
        "overheadlineunbalanced" => lines::map_overhead_unbalanced,
        "overheadline" => lines::map_overhead_balanced,
        "undergroundline" => lines::map_underground,
        "customerload" => loads::map_customer_load,
        "transformer" => transformers::map_transformer,
        "regulator" => regulators::map_regulator,
        "shuntcapacitor" => capacitors::map_shunt_capacitor,
        "switch" => switches::map_switch,
        "breaker" => switches::map_breaker,
        "recloser" => switches::map_recloser,
        "fuse" => switches::map_fuse,
        _ => return None,
    };
    Some(map)
}

fn has_devices(ctx: &NetworkContext<'_>, types: &[i64]) -> bool {
    ctx.network_rows("sectiondevice")
        .map(|rows| {
            rows.iter().any(|row| {
                row.opt_i64("DeviceType")
                    .ok()
                    .flatten()
                    .is_some_and(|t| types.contains(&t))
            })
        })
        .unwrap_or(false)
}

/// Convert one network of `store` into a reduced object graph.
///
/// Device-level problems are recorded in the returned diagnostics; an error
/// means the network as a whole cannot be converted.
pub fn convert_network(
    store: &TableStore,
    config: &ConvertConfig,
    names: &mut NameRegistry,
    network_id: &str,
) -> CymeResult<ConvertedNetwork> {
    if let Some(table) = store.missing_core_tables().first() {
        return Err(CymeError::MissingTable(table.to_string()));
    }
    let mut ctx = NetworkContext::new(store, config, names, network_id);

    links::map_links(&mut ctx)?;
    resolver::map_nodes(&mut ctx)?;
    resolver::repair(&mut ctx)?;

    for &(table, category, types) in DEVICE_TABLES {
        if !store.has_table(table) && !has_devices(&ctx, types) {
            debug!(network = network_id, table, "no devices, table not needed");
            continue;
        }
        if let Some(map) = mapper(table) {
            map_table(&mut ctx, table, category, map)?;
        }
    }

    resolver::repair(&mut ctx)?;
    reducer::collapse_links(&mut ctx)?;
    reducer::deduplicate(&mut ctx)?;
    final_check(&mut ctx);

    let topology = topology_stats(&ctx.graph);
    debug!(
        network = network_id,
        buses = topology.bus_count,
        edges = topology.edge_count,
        islands = topology.islands,
        "network topology"
    );

    Ok(ConvertedNetwork {
        network_id: network_id.to_string(),
        objects: ctx.graph,
        assumptions: ctx.assumptions,
        stats: ctx.stats,
        diagnostics: ctx.diag,
    })
}

/// `Version` of a network row; an empty or absent cell reads as `-1`.
fn network_version<'s>(store: &'s TableStore, network_id: &str) -> CymeResult<&'s str> {
    match store.value("network", network_id, "Version", None) {
        Ok(version) => Ok(version),
        Err(CymeError::Field { .. }) => Ok("-1"),
        Err(err) => Err(err),
    }
}

/// Model versions with an extractor.
fn check_version(network_id: &str, version: &str, diag: &mut Diagnostics) -> CymeResult<()> {
    if version.starts_with("50") {
        Ok(())
    } else if version == "-1" {
        warn!(network = network_id, "CYME model version is not specified");
        diag.add_warning_with_entity(
            "version",
            "CYME model version is not specified, assuming 5020",
            network_id,
        );
        Ok(())
    } else {
        Err(CymeError::UnsupportedVersion(version.to_string()))
    }
}

fn metadata(mdbname: &str, network: &Row<'_>, glm_path: &Path) -> GlmMetadata {
    let mut metadata = GlmMetadata::new(mdbname, network.id());
    metadata.glm_path = glm_path.display().to_string();
    metadata.cyme_version = network.get("Version").map(str::to_string);
    metadata.cyme_created = network.get("CreationTime").map(cyme_timestamp);
    metadata.cyme_modified = network.get("LastChange").map(cyme_timestamp);
    metadata.cyme_loadfactor = network.get("LoadFactor").map(str::to_string);
    metadata
}

/// Write the model of one converted network and its side artifacts.
/// Returns the path of the GLM file.
fn write_network(
    run: &mut RunContext,
    options: &RunOptions,
    mdbname: &str,
    network: &Row<'_>,
    converted: &ConvertedNetwork,
    modifications: &[ModificationSet],
) -> Result<PathBuf> {
    let id = &converted.network_id;
    let prefix = &run.config.network_prefix;
    let glm_path = options.output_dir.join(format!("{prefix}{mdbname}_{id}.glm"));

    let mut doc = GlmDocument::new(metadata(mdbname, network, &glm_path), &converted.objects);
    doc.defines = run.config.defines()?;
    doc.includes = run.config.include.clone();
    doc.nominal_voltage = run.config.nominal_voltage.clone();
    doc.modifications = modifications;
    if doc.nominal_voltage.is_none() && doc.includes.is_empty() {
        error!(network = %id, "GLM_NOMINAL_VOLTAGE is not defined");
        run.diag.add_error_with_entity(
            "config",
            "GLM_NOMINAL_VOLTAGE must be defined in either the configuration or an included file",
            id,
        );
    }

    match run.config.assumptions {
        AssumptionsMode::Include => doc.assumptions = Some(&converted.assumptions),
        AssumptionsMode::Save => {
            let path = options
                .output_dir
                .join(format!("{prefix}{mdbname}_{id}_assumptions.glm"));
            export_assumptions_glm(&converted.assumptions, mdbname, id, &path)?;
        }
        AssumptionsMode::Warn => {
            let path = options
                .output_dir
                .join(format!("{mdbname}_{id}_assumptions.csv"));
            export_assumptions_csv(&converted.assumptions, &path)?;
            if !converted.assumptions.is_empty() {
                let message = format!(
                    "{} assumptions made, see '{}' for details",
                    converted.assumptions.len(),
                    path.display()
                );
                warn!(network = %id, "{message}");
                run.diag.add_warning_with_entity("assumptions", &message, id);
            }
        }
        AssumptionsMode::Ignore => {}
    }

    export_to_glm(&doc, &glm_path)?;
    if options.dot {
        let dot_path = options.output_dir.join(format!("{prefix}{mdbname}_{id}.dot"));
        export_to_dot(&converted.objects, &format!("{mdbname}_{id}"), &dot_path)?;
    }
    Ok(glm_path)
}

/// Convert every selected network of the export in `options.data_dir`.
///
/// Failures of a single network are recorded in the summary and the run
/// continues; unreadable input, missing core tables and unwritable output
/// abort the run.
pub fn run(options: &RunOptions, config: ConvertConfig) -> Result<RunSummary> {
    config.validate()?;
    let store = TableStore::load(&options.data_dir)?;
    let mdbname = options
        .data_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("cyme")
        .to_string();
    run_store(&store, &mdbname, options, config)
}

/// [`run`] over tables that are already loaded.
pub fn run_store(
    store: &TableStore,
    mdbname: &str,
    options: &RunOptions,
    config: ConvertConfig,
) -> Result<RunSummary> {
    let started = Instant::now();
    let missing = store.missing_core_tables();
    if !missing.is_empty() {
        bail!(
            "required CYME tables missing from '{}': {}",
            options.data_dir.display(),
            missing.join(", ")
        );
    }

    let mut run = RunContext::new(config);
    let pattern = run.config.network_regex()?;
    let mut modifications = Vec::new();
    for name in run.config.modify.clone() {
        let set = read_modifications(&options.input_dir, &name, &mut run.diag)
            .with_context(|| format!("reading modifications '{name}'"))?;
        modifications.push(set);
    }
    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!("creating output directory '{}'", options.output_dir.display())
    })?;

    let mut summary = RunSummary::default();
    let networks = store.table("network")?;
    for network in networks.rows() {
        let id = network.id();
        if !pattern.is_match(id) {
            continue;
        }
        info!(network = id, "converting network");
        let mut entry = NetworkSummary {
            network_id: id.to_string(),
            glm_path: None,
            stats: ConversionStats::default(),
        };

        let converted = network_version(store, id)
            .and_then(|version| check_version(id, version, &mut run.diag))
            .and_then(|()| convert_network(store, &run.config, &mut run.names, id));
        match converted {
            Ok(converted) => {
                let path = write_network(
                    &mut run,
                    options,
                    mdbname,
                    &network,
                    &converted,
                    &modifications,
                )?;
                info!(network = id, path = %path.display(), "{}", converted.stats);
                entry.glm_path = Some(path);
                entry.stats = converted.stats;
                run.diag.merge_network(id, converted.diagnostics);
            }
            Err(err) => {
                error!(network = id, "conversion failed: {err}");
                run.diag.add_network_failure(id, &err);
            }
        }
        summary.networks.push(entry);
    }

    if summary.networks.is_empty() {
        let message = format!(
            "no networks match '{}' in '{}'",
            run.config.network_matches, mdbname
        );
        warn!("{message}");
        run.diag.add_warning("network", &message);
    }

    summary.diagnostics = run.diag;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "CYME-to-GridLAB-D conversion done: {} networks processed, {} warnings, {} errors",
        summary.processed(),
        summary.warning_count(),
        summary.error_count()
    );
    Ok(summary)
}
