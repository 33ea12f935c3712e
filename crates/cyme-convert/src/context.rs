//! Run and network state threaded through the conversion pipeline.

use std::collections::HashMap;

use cyme_core::{
    Assumptions, ConversionStats, CymeError, CymeResult, Diagnostics, NameRegistry, ObjectGraph,
    PhaseSet,
};
use cyme_io::{Row, TableStore};
use tracing::warn;

use crate::config::ConvertConfig;

/// State shared by every network of one run.
#[derive(Debug)]
pub struct RunContext {
    pub config: ConvertConfig,
    /// Unknown-class prefixes are allocated once per run
    pub names: NameRegistry,
    pub diag: Diagnostics,
}

impl RunContext {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            names: NameRegistry::new(),
            diag: Diagnostics::new(),
        }
    }
}

/// State of the network being converted.
///
/// Rows handed out by the lookup helpers borrow the table store, not the
/// context, so mappers can hold them while mutating the graph.
pub struct NetworkContext<'a> {
    pub store: &'a TableStore,
    pub config: &'a ConvertConfig,
    pub names: &'a mut NameRegistry,
    pub network_id: String,
    pub graph: ObjectGraph,
    pub assumptions: Assumptions,
    pub diag: Diagnostics,
    pub stats: ConversionStats,
    /// Union of the phases of every link placed on a node, by node name
    incidence: HashMap<String, PhaseSet>,
}

impl<'a> NetworkContext<'a> {
    pub fn new(
        store: &'a TableStore,
        config: &'a ConvertConfig,
        names: &'a mut NameRegistry,
        network_id: &str,
    ) -> Self {
        Self {
            store,
            config,
            names,
            network_id: network_id.to_string(),
            graph: ObjectGraph::new(),
            assumptions: Assumptions::new(),
            diag: Diagnostics::new(),
            stats: ConversionStats::default(),
            incidence: HashMap::new(),
        }
    }

    /// Rows of `table` belonging to this network. Tables without a
    /// `NetworkId` column are shared by all networks.
    pub fn network_rows(&self, table: &str) -> CymeResult<Vec<Row<'a>>> {
        let store: &'a TableStore = self.store;
        let table = store.table(table)?;
        if table.has_column("NetworkId") {
            Ok(table.find(&[("NetworkId", self.network_id.as_str())]))
        } else {
            Ok(table.rows().collect())
        }
    }

    /// The single row of `table` in this network whose `column` equals `id`.
    pub fn network_row(&self, table: &str, column: &str, id: &str) -> CymeResult<Row<'a>> {
        let store: &'a TableStore = self.store;
        let source = store.table(table)?;
        let mut filters = vec![(column, id)];
        if source.has_column("NetworkId") {
            filters.push(("NetworkId", self.network_id.as_str()));
        }
        let rows = source.find(&filters);
        match rows.len() {
            1 => Ok(rows[0]),
            0 => Err(CymeError::NotFound {
                table: table.to_string(),
                column: column.to_string(),
                id: id.to_string(),
            }),
            count => Err(CymeError::Ambiguous {
                table: table.to_string(),
                column: column.to_string(),
                id: id.to_string(),
                count,
            }),
        }
    }

    /// Equipment record by primary key; a missing record is reported as an
    /// equipment lookup failure.
    pub fn equipment(&self, table: &str, id: &str) -> CymeResult<Row<'a>> {
        let store: &'a TableStore = self.store;
        match store.get(table, id, None) {
            Ok(row) => Ok(row),
            Err(CymeError::NotFound { .. }) => Err(CymeError::EquipmentLookup {
                table: table.to_string(),
                id: id.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Section device record and the section it sits on.
    pub fn device_section(&self, device_id: &str) -> CymeResult<(Row<'a>, Row<'a>)> {
        let device = self.network_row("sectiondevice", "DeviceNumber", device_id)?;
        let section_id = device.str("SectionId")?;
        let section = self.network_row("section", "SectionId", section_id)?;
        Ok((device, section))
    }

    pub fn node_name(&mut self, node_id: &str) -> String {
        self.names.name(node_id, Some("node"))
    }

    pub fn link_name(&mut self, device_id: &str) -> String {
        self.names.name(device_id, Some("link"))
    }

    pub fn add_incidence(&mut self, node: &str, phases: PhaseSet) {
        *self.incidence.entry(node.to_string()).or_default() |= phases;
    }

    pub fn incident_phases(&self, node: &str) -> PhaseSet {
        self.incidence.get(node).copied().unwrap_or_default()
    }

    pub fn assume(
        &mut self,
        object: &str,
        property: &str,
        value: impl ToString,
        remark: impl Into<String>,
    ) {
        self.assumptions.assume(object, property, value, remark);
    }

    pub fn warn(&mut self, category: &str, message: &str, entity: &str) {
        warn!(network = %self.network_id, category, entity, "{message}");
        self.diag.add_warning_with_entity(category, message, entity);
    }
}
