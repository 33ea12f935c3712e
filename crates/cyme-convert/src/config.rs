//! Conversion settings.
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! network_prefix = "IEEE13_"
//! network_matches = "^FEEDER"
//! nominal_voltage = "2.40178 kV"
//! include = ["config.glm"]
//! define = ["SOLUTIONDUMP=yes"]
//! modify = ["modify.csv"]
//! assumptions = "include"
//! collapse_strategy = "parent-chains"
//! load_scale = "by-connection"
//!
//! [defaults]
//! transformer_connect_type = "WYE_WYE"
//! transformer_install_type = "PADMOUNT"
//! ```

use std::path::Path;

use cyme_core::units::leading_number;
use cyme_core::{CymeError, CymeResult};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// What to do with the assumptions made while converting a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssumptionsMode {
    /// Append `modify` statements to the model
    #[default]
    Include,
    /// Write a separate `_assumptions.glm` file
    Save,
    /// Write a CSV file and emit a warning
    Warn,
    Ignore,
}

/// How leftover link placeholders are folded into parent chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollapseStrategy {
    /// Collapse links and also re-parent grandchildren to their grandparent
    #[default]
    ParentChains,
    /// Collapse links only
    LinksOnly,
}

/// Divisor applied to a declared load value before it is spread over phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadScale {
    /// Wye: number of phases. Delta: 1 for single phase, 3 otherwise.
    #[default]
    ByConnection,
    /// Declared values are used per phase as is
    None,
}

/// Values used where CYME carries no data and no assumption is recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefaults {
    #[serde(default = "default_connect_type")]
    pub transformer_connect_type: String,
    #[serde(default = "default_install_type")]
    pub transformer_install_type: String,
    #[serde(default = "default_regulator_time_delay")]
    pub regulator_time_delay: String,
    #[serde(default = "default_fuse_current_limit")]
    pub fuse_current_limit: f64,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            transformer_connect_type: default_connect_type(),
            transformer_install_type: default_install_type(),
            regulator_time_delay: default_regulator_time_delay(),
            fuse_current_limit: default_fuse_current_limit(),
        }
    }
}

fn default_connect_type() -> String {
    "WYE_WYE".to_string()
}

fn default_install_type() -> String {
    "PADMOUNT".to_string()
}

fn default_regulator_time_delay() -> String {
    "30s".to_string()
}

fn default_fuse_current_limit() -> f64 {
    9999.0
}

/// Conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    /// Prepended to every output file name
    #[serde(default)]
    pub network_prefix: String,
    /// Regular expression selecting the network ids to convert
    #[serde(default = "default_network_matches")]
    pub network_matches: String,
    /// Value of `GLM_NOMINAL_VOLTAGE`, e.g. `"2.40178 kV"`
    #[serde(default)]
    pub nominal_voltage: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    /// `NAME=VALUE` pairs written as `#define`
    #[serde(default)]
    pub define: Vec<String>,
    /// Modification CSV files, relative to the input directory
    #[serde(default)]
    pub modify: Vec<String>,
    #[serde(default)]
    pub assumptions: AssumptionsMode,
    #[serde(default)]
    pub collapse_strategy: CollapseStrategy,
    #[serde(default)]
    pub load_scale: LoadScale,
    #[serde(default)]
    pub defaults: DeviceDefaults,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            network_prefix: String::new(),
            network_matches: default_network_matches(),
            nominal_voltage: None,
            include: Vec::new(),
            define: Vec::new(),
            modify: Vec::new(),
            assumptions: AssumptionsMode::default(),
            collapse_strategy: CollapseStrategy::default(),
            load_scale: LoadScale::default(),
            defaults: DeviceDefaults::default(),
        }
    }
}

fn default_network_matches() -> String {
    ".*".to_string()
}

impl ConvertConfig {
    pub fn from_toml_str(text: &str) -> CymeResult<Self> {
        let config: ConvertConfig =
            toml::from_str(text).map_err(|e| CymeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CymeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CymeError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CymeResult<()> {
        self.network_regex()?;
        if let Some(voltage) = &self.nominal_voltage {
            if leading_number(voltage).is_none() {
                return Err(CymeError::Config(format!(
                    "nominal_voltage '{voltage}' does not start with a number"
                )));
            }
        }
        self.defines()?;
        Ok(())
    }

    /// Network selector. The pattern is anchored at the start of the id.
    pub fn network_regex(&self) -> CymeResult<Regex> {
        Regex::new(&format!("^(?:{})", self.network_matches)).map_err(|e| {
            CymeError::Config(format!(
                "network_matches '{}' is not a valid pattern: {e}",
                self.network_matches
            ))
        })
    }

    /// Nominal voltage in kV, taken from the leading number of the setting.
    pub fn nominal_kv(&self) -> Option<f64> {
        self.nominal_voltage.as_deref().and_then(leading_number)
    }

    /// `define` entries split into names and values.
    pub fn defines(&self) -> CymeResult<Vec<(String, String)>> {
        self.define
            .iter()
            .map(|entry| match entry.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    Ok((name.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(CymeError::Config(format!(
                    "define '{entry}' must have the form NAME=VALUE"
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert_eq!(config.assumptions, AssumptionsMode::Include);
        assert_eq!(config.collapse_strategy, CollapseStrategy::ParentChains);
        assert_eq!(config.defaults.transformer_connect_type, "WYE_WYE");
        assert!(config.network_regex().unwrap().is_match("ANYTHING"));
    }

    #[test]
    fn test_full_config() {
        let config = ConvertConfig::from_toml_str(
            r#"
            network_prefix = "IEEE13_"
            network_matches = "FEEDER"
            nominal_voltage = "2.40178 kV"
            define = ["SOLUTIONDUMP=yes", "A = b=c"]
            assumptions = "warn"
            collapse_strategy = "links-only"
            load_scale = "none"

            [defaults]
            transformer_install_type = "POLETOP"
            "#,
        )
        .unwrap();
        assert_eq!(config.nominal_kv(), Some(2.40178));
        assert_eq!(config.load_scale, LoadScale::None);
        assert_eq!(config.defaults.transformer_install_type, "POLETOP");
        assert_eq!(config.defaults.transformer_connect_type, "WYE_WYE");
        let defines = config.defines().unwrap();
        assert_eq!(defines[1], ("A".to_string(), "b=c".to_string()));

        let re = config.network_regex().unwrap();
        assert!(re.is_match("FEEDER_1"));
        assert!(!re.is_match("SUB_FEEDER"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ConvertConfig::from_toml_str("assumptions = \"loud\""),
            Err(CymeError::Config(_))
        ));
        assert!(matches!(
            ConvertConfig::from_toml_str("nominal_voltage = \"kV\""),
            Err(CymeError::Config(_))
        ));
        assert!(matches!(
            ConvertConfig::from_toml_str("network_matches = \"(\""),
            Err(CymeError::Config(_))
        ));
        assert!(matches!(
            ConvertConfig::from_toml_str("define = [\"NOVALUE\"]"),
            Err(CymeError::Config(_))
        ));
        assert!(ConvertConfig::from_toml_str("unknown_key = 1").is_err());
    }
}
