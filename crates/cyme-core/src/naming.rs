//! Deterministic object naming.
//!
//! GridLAB-D object names must be unique within a model, must not start with a
//! digit and must not contain whitespace. CYME identifiers are free text, and
//! the same identifier is often reused across device categories, so every name
//! is prefixed with a short tag derived from its object class.

use std::collections::BTreeMap;

use tracing::warn;

/// Longest composite name kept before prefixing.
pub const MAX_COMPOSITE_LEN: usize = 63;

/// Name prefixes of the GridLAB-D powerflow classes.
pub const CLASS_PREFIXES: &[(&str, &str)] = &[
    ("billdump", "BD_"),
    ("capacitor", "CA_"),
    ("currdump", "CD_"),
    ("emissions", "EM_"),
    ("fault_check", "FC_"),
    ("frequency_gen", "FG_"),
    ("fuse", "FS_"),
    ("impedance_dump", "ID_"),
    ("line", "LN_"),
    ("line_configuration", "LC_"),
    ("line_sensor", "LS_"),
    ("line_spacing", "LG_"),
    ("link", "LK_"),
    ("load", "LD_"),
    ("load_tracker", "LT_"),
    ("meter", "ME_"),
    ("motor", "MO_"),
    ("node", "ND_"),
    ("overhead_line", "OL_"),
    ("overhead_line_conductor", "OC_"),
    ("pole", "PO_"),
    ("pole_configuration", "PC_"),
    ("power_metrics", "PM_"),
    ("powerflow_library", "PL_"),
    ("powerflow_object", "PO_"),
    ("pqload", "PQ_"),
    ("recloser", "RE_"),
    ("regulator", "RG_"),
    ("regulator_configuration", "RC_"),
    ("restoration", "RS_"),
    ("sectionalizer", "SE_"),
    ("series_reactor", "SR_"),
    ("substation", "SS_"),
    ("switch", "SW_"),
    ("switch_coordinator", "SC_"),
    ("transformer", "TF_"),
    ("transformer_configuration", "TC_"),
    ("triplex_line", "XL_"),
    ("triplex_line_conductor", "XC_"),
    ("triplex_line_configuration", "XG_"),
    ("triplex_load", "XD_"),
    ("triplex_meter", "XM_"),
    ("triplex_node", "XN_"),
    ("underground_line", "UL_"),
    ("underground_line_conductor", "UC_"),
    ("vfd", "VF_"),
    ("volt_var_control", "VV_"),
    ("voltdump", "VD_"),
];

/// Maps raw identifiers to GridLAB-D object names.
///
/// The registry lives for a whole run: a prefix allocated for an unknown class
/// while converting one network is reused by every later network.
#[derive(Debug, Clone)]
pub struct NameRegistry {
    prefixes: BTreeMap<String, String>,
    allocated: Vec<(String, String)>,
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NameRegistry {
    pub fn new() -> Self {
        Self {
            prefixes: CLASS_PREFIXES
                .iter()
                .map(|(class, prefix)| (class.to_string(), prefix.to_string()))
                .collect(),
            allocated: Vec::new(),
        }
    }

    /// Name for a single raw identifier, optionally prefixed by class.
    pub fn name(&mut self, raw_id: &str, kind: Option<&str>) -> String {
        let name = match kind {
            Some(kind) => format!("{}{}", self.prefix(kind), raw_id),
            None if raw_id.starts_with(|c: char| c.is_ascii_digit()) => format!("_{raw_id}"),
            None => raw_id.to_string(),
        };
        name.replace([' ', '-'], "_")
    }

    /// Name built from several identifiers, e.g. the conductors and spacing of
    /// a line configuration.
    pub fn composite<S: AsRef<str>>(&mut self, parts: &[S], kind: Option<&str>) -> String {
        let joined = parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("_")
            .replace(['.', ':'], "");
        let truncated: String = joined.chars().take(MAX_COMPOSITE_LEN).collect();
        self.name(&truncated, kind)
    }

    /// Prefix for a class, allocating `Z{n}_` the first time an unknown class
    /// is seen.
    pub fn prefix(&mut self, kind: &str) -> String {
        if let Some(prefix) = self.prefixes.get(kind) {
            return prefix.clone();
        }
        let prefix = format!("Z{}_", self.prefixes.len());
        warn!(
            class = kind,
            prefix = %prefix,
            "class is not a known powerflow class, allocating name prefix"
        );
        self.prefixes.insert(kind.to_string(), prefix.clone());
        self.allocated.push((kind.to_string(), prefix.clone()));
        prefix
    }

    /// Prefixes allocated for unknown classes since the last call, so the
    /// caller can record them as diagnostics for the network that caused them.
    pub fn take_allocated(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.allocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        let mut names = NameRegistry::new();
        assert_eq!(names.name("101", Some("node")), "ND_101");
        assert_eq!(names.name("S 12", Some("switch")), "SW_S_12");
        assert_eq!(names.name("L-7", Some("overhead_line")), "OL_L_7");
    }

    #[test]
    fn test_leading_digit_without_class() {
        let mut names = NameRegistry::new();
        assert_eq!(names.name("12", None), "_12");
        assert_eq!(names.name("feeder 1", None), "feeder_1");
    }

    #[test]
    fn test_composite_strips_and_truncates() {
        let mut names = NameRegistry::new();
        let name = names.composite(&["336.4 ACSR", "4/0:A", "SP1"], Some("line_configuration"));
        assert_eq!(name, "LC_3364_ACSR_4/0A_SP1");

        let long = "x".repeat(80);
        let name = names.composite(&[long.as_str()], None);
        assert_eq!(name.len(), MAX_COMPOSITE_LEN);
    }

    #[test]
    fn test_unknown_class_allocates_stable_prefix() {
        let mut names = NameRegistry::new();
        let n = CLASS_PREFIXES.len();
        let first = names.name("a", Some("widget"));
        assert_eq!(first, format!("Z{n}_a"));
        let second = names.name("b", Some("widget"));
        assert_eq!(second, format!("Z{n}_b"));
        let other = names.name("c", Some("gizmo"));
        assert_eq!(other, format!("Z{}_c", n + 1));

        let allocated = names.take_allocated();
        assert_eq!(allocated.len(), 2);
        assert!(names.take_allocated().is_empty());
    }

    #[test]
    fn test_naming_is_deterministic() {
        let mut a = NameRegistry::new();
        let mut b = NameRegistry::new();
        for id in ["1", "X 2", "y-3"] {
            assert_eq!(a.name(id, Some("load")), b.name(id, Some("load")));
        }
    }
}
