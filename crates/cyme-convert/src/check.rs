//! Final consistency check of a reduced network.

use cyme_core::CymeError;

use crate::context::NetworkContext;

/// Report objects the writer cannot emit cleanly and fill in the final
/// statistics. Nothing found here fails the network.
pub fn final_check(ctx: &mut NetworkContext<'_>) {
    let mut warnings = Vec::new();
    for object in ctx.graph.iter() {
        if object.class.is_abstract() {
            warnings.push((
                "abstract_class",
                format!(
                    "object '{}' has abstract class '{}' and cannot be instantiated",
                    object.name, object.class
                ),
                object.name.clone(),
            ));
        }
        for property in ["from", "to", "parent"] {
            let Some(target) = object.get(property) else {
                continue;
            };
            if !ctx.graph.contains(target) {
                let err = CymeError::UnresolvedReference {
                    object: object.name.clone(),
                    property: property.to_string(),
                    target: target.to_string(),
                };
                warnings.push((err.category(), err.to_string(), object.name.clone()));
            }
        }
    }
    for (class, prefix) in ctx.names.take_allocated() {
        warnings.push((
            "naming",
            format!("class '{class}' is not a known powerflow class, using prefix '{prefix}'"),
            class,
        ));
    }
    for (category, message, entity) in warnings {
        ctx.warn(category, &message, &entity);
    }

    let graph = &ctx.graph;
    ctx.assumptions.retain_objects(|name| graph.contains(name));
    ctx.stats.objects = ctx.graph.class_counts();
    ctx.stats.assumptions = ctx.assumptions.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use cyme_core::{MergeMode, NameRegistry, ObjectClass, Properties};
    use cyme_io::TableStore;

    #[test]
    fn test_dangling_references_and_stats() {
        let store = TableStore::default();
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        for (class, name, props) in [
            (ObjectClass::Node, "ND_1", Properties::new()),
            (
                ObjectClass::Load,
                "LD_2",
                Properties::new().with("parent", "ND_9"),
            ),
            (
                ObjectClass::Switch,
                "SW_3",
                Properties::new().with("from", "ND_1").with("to", "ND_1"),
            ),
        ] {
            ctx.graph
                .upsert(ctx.names, class, name, name, props, MergeMode::Overwrite)
                .unwrap();
        }
        ctx.assume("LD_2", "constant_power_A", "0", "kept");
        ctx.assume("OL_gone", "length", "1 m", "dropped");

        final_check(&mut ctx);
        let unresolved: Vec<_> = ctx.diag.issues_by_category("reference").collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].entity.as_deref(), Some("LD_2"));
        assert_eq!(ctx.stats.class_count("node"), 1);
        assert_eq!(ctx.stats.object_count(), 3);
        assert_eq!(ctx.stats.assumptions, 1);
    }

    #[test]
    fn test_abstract_and_unknown_classes() {
        let store = TableStore::default();
        let config = ConvertConfig::default();
        let mut names = NameRegistry::new();
        let prefixed = names.name("X1", Some("battery_bank"));
        let mut ctx = NetworkContext::new(&store, &config, &mut names, "F1");
        ctx.graph
            .upsert(
                ctx.names,
                ObjectClass::Line,
                "LN_1",
                "1",
                Properties::new(),
                MergeMode::Overwrite,
            )
            .unwrap();

        final_check(&mut ctx);
        assert_eq!(ctx.diag.issues_by_category("abstract_class").count(), 1);
        let naming: Vec<_> = ctx.diag.issues_by_category("naming").collect();
        assert_eq!(naming.len(), 1);
        assert!(naming[0].message.contains(prefixed.trim_end_matches("X1")));
    }
}
