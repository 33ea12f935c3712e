use anyhow::{Context, Result};
use cyme_core::{Assumptions, ObjectGraph, Value};
use std::fs;
use std::path::Path;

use super::metadata::GlmMetadata;
use crate::importers::ModificationSet;

/// Everything that goes into one GLM file.
#[derive(Debug, Clone)]
pub struct GlmDocument<'a> {
    pub metadata: GlmMetadata,
    /// User defines in configuration order
    pub defines: Vec<(String, String)>,
    pub includes: Vec<String>,
    pub nominal_voltage: Option<String>,
    pub objects: &'a ObjectGraph,
    /// Assumptions written inline as `modify` statements
    pub assumptions: Option<&'a Assumptions>,
    pub modifications: &'a [ModificationSet],
}

impl<'a> GlmDocument<'a> {
    pub fn new(metadata: GlmMetadata, objects: &'a ObjectGraph) -> Self {
        Self {
            metadata,
            defines: Vec::new(),
            includes: Vec::new(),
            nominal_voltage: None,
            objects,
            assumptions: None,
            modifications: &[],
        }
    }
}

/// Export a converted network to a GLM model string
pub fn export_to_glm_string(doc: &GlmDocument<'_>) -> Result<String> {
    let mut output = String::new();

    output.push_str(&format!(
        "// Automatically generated by {} {}\n",
        doc.metadata.app_command, doc.metadata.app_version
    ));

    section(&mut output, "Application information");
    define(&mut output, "APP_COMMAND", &doc.metadata.app_command);
    define(&mut output, "APP_VERSION", &doc.metadata.app_version);

    section(&mut output, "GLM creation context");
    define(&mut output, "GLM_PATHNAME", &doc.metadata.glm_path);
    define(&mut output, "GLM_CREATED", &doc.metadata.creation_timestamp());

    section(&mut output, "CYME model information");
    for (name, value) in doc.metadata.model_defines() {
        define(&mut output, name, &value);
    }

    write_settings(doc, &mut output);

    section(&mut output, "Modules");
    output.push_str("module powerflow\n{\n\tsolver_method \"NR\";\n}\n");

    section(&mut output, "Objects");
    write_objects(doc.objects, &mut output);

    if let Some(assumptions) = doc.assumptions.filter(|a| !a.is_empty()) {
        section(&mut output, "Assumptions");
        for a in assumptions.iter() {
            output.push_str(&format!(
                "modify {}.{} \"{}\"; // {}\n",
                a.object,
                a.property,
                escape(&a.value),
                a.remark
            ));
        }
    }

    for set in doc.modifications {
        section(&mut output, &format!("Modifications from '{}'", set.source));
        for m in &set.rows {
            output.push_str(&format!(
                "modify {}.{} \"{}\";\n",
                m.object,
                m.property,
                escape(&m.value)
            ));
        }
    }

    Ok(output)
}

/// Export a converted network to a GLM file
pub fn export_to_glm(doc: &GlmDocument<'_>, output_file: &Path) -> Result<()> {
    let content = export_to_glm_string(doc)?;
    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }
    fs::write(output_file, content)
        .with_context(|| format!("writing GLM file '{}'", output_file.display()))?;
    Ok(())
}

/// Escape a value written between double quotes.
pub(crate) fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

fn section(output: &mut String, title: &str) {
    output.push_str(&format!("\n//\n// {title}\n//\n"));
}

fn define(output: &mut String, name: &str, value: &str) {
    output.push_str(&format!("#define {name}={value}\n"));
}

fn write_settings(doc: &GlmDocument<'_>, output: &mut String) {
    section(output, "Settings from configuration");
    for (name, value) in &doc.defines {
        define(output, name, value);
    }
    if let Some(voltage) = &doc.nominal_voltage {
        define(output, "GLM_NOMINAL_VOLTAGE", voltage);
    }
    for include in &doc.includes {
        output.push_str(&format!("#include \"{include}\"\n"));
    }
    if doc.nominal_voltage.is_none() && !doc.includes.is_empty() {
        output.push_str("#ifndef GLM_NOMINAL_VOLTAGE\n");
        output.push_str(
            "#error GLM_NOMINAL_VOLTAGE must be defined in either the configuration or an included file\n",
        );
        output.push_str("#endif\n");
    }
}

/// Write one `object` block per object, in creation order
fn write_objects(objects: &ObjectGraph, output: &mut String) {
    for object in objects.iter() {
        output.push_str(&format!("object {}\n{{\n", object.class));
        output.push_str(&format!("\tname \"{}\";\n", escape(&object.name)));
        for (key, value) in object.properties.iter() {
            match value {
                Value::Str(s) => output.push_str(&format!("\t{key} \"{}\";\n", escape(s))),
                Value::Num(_) => output.push_str(&format!("\t{key} {value};\n")),
                Value::Unset => {}
            }
        }
        output.push_str("}\n");
    }
}
