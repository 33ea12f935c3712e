use anyhow::{Context, Result};
use cyme_core::{export_graph, ObjectGraph};
use std::fs;
use std::path::Path;

/// Write the network map of a converted network as a Graphviz DOT file.
pub fn export_to_dot(objects: &ObjectGraph, name: &str, output_file: &Path) -> Result<()> {
    let dot = export_graph(objects, name, "dot")?;
    fs::write(output_file, dot)
        .with_context(|| format!("writing network map '{}'", output_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyme_core::{MergeMode, NameRegistry, ObjectClass, Properties};

    #[test]
    fn test_dot_file() {
        let mut names = NameRegistry::new();
        let mut graph = ObjectGraph::new();
        let props = Properties::new().with("from", "ND_1").with("to", "ND_2");
        graph
            .upsert(&mut names, ObjectClass::Switch, "SW_1", "1", props, MergeMode::Overwrite)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.dot");
        export_to_dot(&graph, "net", &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("graph \"net\" {"));
        assert!(text.contains("label=\"switch\""));
    }
}
