//! GridLAB-D object model: classes, property values and ordered property
//! lists.

use std::fmt;

use serde::Serialize;

use crate::units::format_g;

/// Object class of a GridLAB-D object.
///
/// The powerflow classes the builder emits are explicit variants; anything else
/// (including classes named in user configuration) is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum ObjectClass {
    /// Provisional edge whose device type is not resolved yet
    Link,
    Node,
    Load,
    Capacitor,
    Switch,
    Fuse,
    Recloser,
    Transformer,
    Regulator,
    OverheadLine,
    UndergroundLine,
    /// Abstract line class
    Line,
    LineConfiguration,
    LineSpacing,
    OverheadLineConductor,
    UndergroundLineConductor,
    TransformerConfiguration,
    RegulatorConfiguration,
    Other(String),
}

impl ObjectClass {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectClass::Link => "link",
            ObjectClass::Node => "node",
            ObjectClass::Load => "load",
            ObjectClass::Capacitor => "capacitor",
            ObjectClass::Switch => "switch",
            ObjectClass::Fuse => "fuse",
            ObjectClass::Recloser => "recloser",
            ObjectClass::Transformer => "transformer",
            ObjectClass::Regulator => "regulator",
            ObjectClass::OverheadLine => "overhead_line",
            ObjectClass::UndergroundLine => "underground_line",
            ObjectClass::Line => "line",
            ObjectClass::LineConfiguration => "line_configuration",
            ObjectClass::LineSpacing => "line_spacing",
            ObjectClass::OverheadLineConductor => "overhead_line_conductor",
            ObjectClass::UndergroundLineConductor => "underground_line_conductor",
            ObjectClass::TransformerConfiguration => "transformer_configuration",
            ObjectClass::RegulatorConfiguration => "regulator_configuration",
            ObjectClass::Other(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "link" => ObjectClass::Link,
            "node" => ObjectClass::Node,
            "load" => ObjectClass::Load,
            "capacitor" => ObjectClass::Capacitor,
            "switch" => ObjectClass::Switch,
            "fuse" => ObjectClass::Fuse,
            "recloser" => ObjectClass::Recloser,
            "transformer" => ObjectClass::Transformer,
            "regulator" => ObjectClass::Regulator,
            "overhead_line" => ObjectClass::OverheadLine,
            "underground_line" => ObjectClass::UndergroundLine,
            "line" => ObjectClass::Line,
            "line_configuration" => ObjectClass::LineConfiguration,
            "line_spacing" => ObjectClass::LineSpacing,
            "overhead_line_conductor" => ObjectClass::OverheadLineConductor,
            "underground_line_conductor" => ObjectClass::UndergroundLineConductor,
            "transformer_configuration" => ObjectClass::TransformerConfiguration,
            "regulator_configuration" => ObjectClass::RegulatorConfiguration,
            other => ObjectClass::Other(other.to_string()),
        }
    }

    /// Classes that replace a link placeholder when upserted under its name.
    pub fn supersedes_link(&self) -> bool {
        matches!(
            self,
            ObjectClass::Switch
                | ObjectClass::Fuse
                | ObjectClass::Recloser
                | ObjectClass::OverheadLine
                | ObjectClass::UndergroundLine
                | ObjectClass::Line
                | ObjectClass::Transformer
                | ObjectClass::Regulator
        )
    }

    /// Priority when several objects connect the same pair of nodes.
    /// Regulator > transformer > switch family > line.
    pub fn edge_rank(&self) -> u8 {
        match self {
            ObjectClass::Regulator => 3,
            ObjectClass::Transformer => 2,
            ObjectClass::Switch | ObjectClass::Fuse | ObjectClass::Recloser => 1,
            _ => 0,
        }
    }

    /// Classes that cannot be instantiated in a GLM model.
    pub fn is_abstract(&self) -> bool {
        matches!(self, ObjectClass::Link | ObjectClass::Line)
            || matches!(self, ObjectClass::Other(name) if name == "powerflow_object")
    }

    /// Node-like classes that may hold a `parent` chain.
    pub fn is_bus(&self) -> bool {
        matches!(self, ObjectClass::Node | ObjectClass::Load)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ObjectClass> for String {
    fn from(class: ObjectClass) -> Self {
        class.as_str().to_string()
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Written quoted
    Str(String),
    /// Written bare
    Num(f64),
    /// Removes the property when merged into an existing object
    Unset,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Num(n) => f.write_str(&format_g(*n, 10)),
            Value::Unset => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Unset)
    }
}

/// Property list that keeps insertion order, so GLM output is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, Value)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of a property, if it is set.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop every `Unset` entry.
    pub fn without_unset(self) -> Self {
        Properties(self.0.into_iter().filter(|(_, v)| !v.is_unset()).collect())
    }
}

impl IntoIterator for Properties {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A named GridLAB-D object.
#[derive(Debug, Clone, PartialEq)]
pub struct GlmObject {
    pub name: String,
    pub class: ObjectClass,
    /// CYME identifier the object was derived from
    pub source_id: String,
    pub properties: Properties,
}

impl GlmObject {
    pub fn new(name: impl Into<String>, class: ObjectClass, source_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class,
            source_id: source_id.into(),
            properties: Properties::new(),
        }
    }

    /// Turn a link placeholder into a concrete device under a new name,
    /// keeping the placeholder's properties.
    pub fn reclassify(self, class: ObjectClass, name: String) -> GlmObject {
        GlmObject {
            name,
            class,
            source_id: self.source_id,
            properties: self.properties,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get_str(key)
    }

    pub fn from_node(&self) -> Option<&str> {
        self.get("from")
    }

    pub fn to_node(&self) -> Option<&str> {
        self.get("to")
    }

    pub fn parent(&self) -> Option<&str> {
        self.get("parent")
    }
}
