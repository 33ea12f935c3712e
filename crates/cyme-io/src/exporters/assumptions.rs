//! Assumption artifacts written next to the GLM model.

use anyhow::{Context, Result};
use cyme_core::Assumptions;
use std::fs;
use std::path::Path;

use super::glm::escape;

/// Write assumptions as a standalone GLM file of `modify` statements.
pub fn export_assumptions_glm(
    assumptions: &Assumptions,
    mdbname: &str,
    network_id: &str,
    path: &Path,
) -> Result<()> {
    let mut output = format!(
        "// Assumptions for GLM conversion from database {mdbname} network {network_id}\n"
    );
    for a in assumptions.iter() {
        output.push_str(&format!(
            "modify {}.{} \"{}\"; // {}\n",
            a.object,
            a.property,
            escape(&a.value),
            a.remark
        ));
    }
    fs::write(path, output)
        .with_context(|| format!("writing assumptions '{}'", path.display()))
}

/// Write assumptions as CSV with columns
/// `object_name,property_name,value,remark`.
pub fn export_assumptions_csv(assumptions: &Assumptions, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating assumptions file '{}'", path.display()))?;
    if assumptions.is_empty() {
        writer.write_record(["object_name", "property_name", "value", "remark"])?;
    }
    for a in assumptions.iter() {
        writer
            .serialize(a)
            .with_context(|| format!("writing assumption for '{}'", a.object))?;
    }
    writer.flush()?;
    Ok(())
}
