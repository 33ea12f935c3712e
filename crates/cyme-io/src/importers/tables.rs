//! In-memory CYME tables.
//!
//! A CYME database export is one CSV file per table (`CYMNODE.csv`,
//! `CYMSECTION.csv`, ...). Every table is keyed by its first column. Keys are
//! not unique: a device can appear once per phase, so single-row fetches
//! report ambiguity instead of picking a row.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cyme_core::{CymeError, CymeResult};
use tracing::debug;

/// CYME tables a complete conversion reads.
pub const REQUIRED_TABLES: &[&str] = &[
    "CYMNETWORK",
    "CYMHEADNODE",
    "CYMNODE",
    "CYMSECTION",
    "CYMSECTIONDEVICE",
    "CYMOVERHEADBYPHASE",
    "CYMOVERHEADLINEUNBALANCED",
    "CYMOVERHEADLINE",
    "CYMUNDERGROUNDLINE",
    "CYMEQCONDUCTOR",
    "CYMEQGEOMETRICALARRANGEMENT",
    "CYMEQOVERHEADLINEUNBALANCED",
    "CYMEQOVERHEADLINE",
    "CYMEQCABLE",
    "CYMSWITCH",
    "CYMBREAKER",
    "CYMRECLOSER",
    "CYMFUSE",
    "CYMCUSTOMERLOAD",
    "CYMLOAD",
    "CYMSHUNTCAPACITOR",
    "CYMTRANSFORMER",
    "CYMEQTRANSFORMER",
    "CYMREGULATOR",
    "CYMEQREGULATOR",
];

/// Tables without which no network can be converted.
pub const CORE_TABLES: &[&str] = &["network", "node", "section", "sectiondevice"];

/// Normalized table name for a file stem: lower-cased, leading `cym` removed.
pub fn table_name(stem: &str) -> String {
    let lower = stem.trim().to_ascii_lowercase();
    match lower.strip_prefix("cym") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => lower,
    }
}

/// One loaded table.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    primary: HashMap<String, Vec<usize>>,
}

impl Table {
    /// Build a table from rows of cells. Short rows are padded with empty
    /// cells; cells beyond the header are dropped.
    pub fn from_rows(name: &str, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row.iter_mut().for_each(|cell| *cell = cell.trim().to_string());
                row
            })
            .collect();
        let mut primary: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            if let Some(key) = row.first() {
                primary.entry(key.clone()).or_default().push(idx);
            }
        }
        Self {
            name: table_name(name),
            columns: columns.into_iter().map(|c| c.trim().to_string()).collect(),
            rows,
            primary,
        }
    }

    /// Convenience constructor used by tests and in-memory callers.
    pub fn from_str_rows(name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::from_rows(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// Rows matching every `(column, value)` pair. A filter on a column the
    /// table does not have matches nothing.
    pub fn find(&self, filters: &[(&str, &str)]) -> Vec<Row<'_>> {
        let mut resolved = Vec::with_capacity(filters.len());
        for (column, value) in filters {
            match self.column_index(column) {
                Some(idx) => resolved.push((idx, *value)),
                None => return Vec::new(),
            }
        }
        let candidates: Box<dyn Iterator<Item = usize>> = match resolved.first() {
            Some((0, key)) => Box::new(
                self.primary
                    .get(*key)
                    .map(|v| v.clone().into_iter())
                    .into_iter()
                    .flatten(),
            ),
            _ => Box::new(0..self.rows.len()),
        };
        candidates
            .filter(|&index| {
                resolved
                    .iter()
                    .all(|(col, value)| self.rows[index][*col] == *value)
            })
            .map(|index| Row { table: self, index })
            .collect()
    }

    /// The single row whose `id_column` (primary key when `None`) equals `id`.
    pub fn get(&self, id: &str, id_column: Option<&str>) -> CymeResult<Row<'_>> {
        let column = match id_column {
            Some(column) => column,
            None => self.primary_key().unwrap_or_default(),
        };
        let matches = self.find(&[(column, id)]);
        match matches.len() {
            1 => Ok(matches[0]),
            0 => Err(CymeError::NotFound {
                table: self.name.clone(),
                column: column.to_string(),
                id: id.to_string(),
            }),
            count => Err(CymeError::Ambiguous {
                table: self.name.clone(),
                column: column.to_string(),
                id: id.to_string(),
                count,
            }),
        }
    }

    /// A single non-empty cell of the row fetched with [`Table::get`].
    pub fn value(&self, id: &str, column: &str, id_column: Option<&str>) -> CymeResult<&str> {
        self.get(id, id_column)?.str(column)
    }
}

/// Borrowed view of one table row with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Value of the primary key column.
    pub fn id(&self) -> &'a str {
        self.table.rows[self.index]
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Raw cell; `None` when the column is absent or the cell is empty.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        let cell = self.table.rows[self.index][idx].as_str();
        (!cell.is_empty()).then_some(cell)
    }

    fn field_error(&self, column: &str, reason: impl Into<String>) -> CymeError {
        CymeError::Field {
            table: self.table.name.clone(),
            id: self.id().to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub fn str(&self, column: &str) -> CymeResult<&'a str> {
        if !self.table.has_column(column) {
            return Err(self.field_error(column, "column does not exist"));
        }
        self.get(column)
            .ok_or_else(|| self.field_error(column, "value is missing"))
    }

    pub fn f64(&self, column: &str) -> CymeResult<f64> {
        self.opt_f64(column)?
            .ok_or_else(|| self.field_error(column, "value is missing"))
    }

    /// `Ok(None)` for an empty cell or missing column, error when malformed.
    pub fn opt_f64(&self, column: &str) -> CymeResult<Option<f64>> {
        match self.get(column) {
            None => Ok(None),
            Some(cell) => cell
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.field_error(column, format!("'{cell}' is not a number"))),
        }
    }

    pub fn i64(&self, column: &str) -> CymeResult<i64> {
        self.opt_i64(column)?
            .ok_or_else(|| self.field_error(column, "value is missing"))
    }

    /// Integers exported as `7` or `7.0` are both accepted.
    pub fn opt_i64(&self, column: &str) -> CymeResult<Option<i64>> {
        let Some(cell) = self.get(column) else {
            return Ok(None);
        };
        if let Ok(value) = cell.parse::<i64>() {
            return Ok(Some(value));
        }
        match cell.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(Some(value as i64)),
            _ => Err(self.field_error(column, format!("'{cell}' is not an integer"))),
        }
    }
}

/// All tables of one database export, keyed by normalized table name.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: BTreeMap<String, Table>,
}

impl TableStore {
    /// Read every `*.csv` file in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("reading table directory '{}'", dir.display()))?;
        let mut tables = BTreeMap::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("listing '{}'", dir.display()))?
                .path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv || !path.is_file() {
                continue;
            }
            let table = read_csv_table(&path)?;
            debug!(table = table.name(), rows = table.len(), "loaded table");
            tables.insert(table.name().to_string(), table);
        }
        Ok(Self { tables })
    }

    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
        }
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> CymeResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| CymeError::MissingTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn find(&self, table: &str, filters: &[(&str, &str)]) -> CymeResult<Vec<Row<'_>>> {
        Ok(self.table(table)?.find(filters))
    }

    pub fn get(&self, table: &str, id: &str, id_column: Option<&str>) -> CymeResult<Row<'_>> {
        self.table(table)?.get(id, id_column)
    }

    pub fn value(
        &self,
        table: &str,
        id: &str,
        column: &str,
        id_column: Option<&str>,
    ) -> CymeResult<&str> {
        self.table(table)?.value(id, column, id_column)
    }

    /// Core tables that are absent.
    pub fn missing_core_tables(&self) -> Vec<&'static str> {
        CORE_TABLES
            .iter()
            .copied()
            .filter(|name| !self.has_table(name))
            .collect()
    }
}

fn read_csv_table(path: &Path) -> Result<Table> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("table file name '{}' is not valid UTF-8", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening table '{}'", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of '{}'", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("parsing '{}' record {}", path.display(), line + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table::from_rows(stem, columns, rows))
}
