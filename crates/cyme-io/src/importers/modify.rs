//! User-supplied property modifications.
//!
//! A modification file is a headerless CSV of `object,property,value` rows
//! that is appended to the model as `modify` statements.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use cyme_core::Diagnostics;

/// One `modify <object>.<property> <value>;` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub object: String,
    pub property: String,
    pub value: String,
}

/// Modifications read from one file, kept together so the writer can label
/// them with their origin.
#[derive(Debug, Clone)]
pub struct ModificationSet {
    pub source: String,
    pub rows: Vec<Modification>,
}

/// Resolve a file name relative to `base`, rejecting absolute paths and
/// parent-directory components.
pub fn resolve_within(base: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => bail!("path traversal detected in '{name}'"),
            Component::RootDir | Component::Prefix(_) => {
                bail!("modification file '{name}' must be relative to the input directory")
            }
        }
    }
    Ok(base.join(relative))
}

/// Read a modification file. Rows with fewer than three fields are skipped
/// and rows with extra fields are truncated; both are reported as warnings.
pub fn read_modifications(
    base: &Path,
    name: &str,
    diag: &mut Diagnostics,
) -> Result<ModificationSet> {
    let path = resolve_within(base, name)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("opening modification file '{}'", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("parsing '{}'", path.display()))?;
        let fields: Vec<&str> = record.iter().map(str::trim).collect();
        let joined = fields.join(",");
        match fields.len() {
            0 => continue,
            1 if fields[0].is_empty() => continue,
            1 | 2 => {
                diag.add_warning(
                    "modify",
                    &format!("{name}: row '{joined}' is missing one or more required fields"),
                );
                continue;
            }
            3 => {}
            _ => diag.add_warning(
                "modify",
                &format!("{name}: row '{joined}' has extra fields that will be ignored"),
            ),
        }
        rows.push(Modification {
            object: fields[0].to_string(),
            property: fields[1].to_string(),
            value: fields[2].to_string(),
        });
    }
    Ok(ModificationSet {
        source: name.to_string(),
        rows,
    })
}
