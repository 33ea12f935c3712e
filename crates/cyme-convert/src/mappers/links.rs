//! Link placeholders, one per section device.

use cyme_core::{CymeResult, MergeMode, ObjectClass, Properties};
use cyme_io::Row;

use super::{cyme_device_name, glm_class, phase_column};
use crate::context::NetworkContext;

/// Create a link placeholder for every device on every section of the
/// network and record the section phases on both end nodes.
pub fn map_links(ctx: &mut NetworkContext<'_>) -> CymeResult<()> {
    for section in ctx.network_rows("section")? {
        let section_id = section.id().to_string();
        match map_section(ctx, section) {
            Ok(()) => {}
            Err(err) if err.is_device_level() => {
                let message = format!("section '{section_id}' dropped: {err}");
                ctx.warn(err.category(), &message, &section_id);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn map_section<'a>(ctx: &mut NetworkContext<'a>, section: Row<'a>) -> CymeResult<()> {
    let section_id = section.id();
    let phases = phase_column(&section, "Phase")?;
    let from = ctx.node_name(section.str("FromNodeId")?);
    let to = ctx.node_name(section.str("ToNodeId")?);

    let store = ctx.store;
    let devices = store.table("sectiondevice")?;
    let mut filters = vec![("SectionId", section_id)];
    if devices.has_column("NetworkId") {
        filters.push(("NetworkId", ctx.network_id.as_str()));
    }
    let rows = devices.find(&filters);

    for device in rows {
        let device_id = device.id();
        let device_type = device.i64("DeviceType")?;
        if glm_class(device_type).is_none() {
            let message = format!(
                "{} on section {section_id} has no corresponding GLM object",
                cyme_device_name(device_type)
            );
            ctx.warn("unsupported_device", &message, device_id);
            continue;
        }

        let name = ctx.link_name(device_id);
        let properties = Properties::new()
            .with("phases", phases.letters())
            .with("nominal_voltage", "${GLM_NOMINAL_VOLTAGE}")
            .with("from", from.as_str())
            .with("to", to.as_str());
        ctx.graph.upsert(
            ctx.names,
            ObjectClass::Link,
            &name,
            device_id,
            properties,
            MergeMode::Overwrite,
        )?;
        ctx.add_incidence(&from, phases.live());
        ctx.add_incidence(&to, phases.live());
    }
    Ok(())
}
