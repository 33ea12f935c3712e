//! Record of values substituted for missing or degenerate source data.

use serde::{Deserialize, Serialize};

/// One substituted property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    #[serde(rename = "object_name")]
    pub object: String,
    #[serde(rename = "property_name")]
    pub property: String,
    pub value: String,
    pub remark: String,
}

/// Assumptions made while converting one network, in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct Assumptions {
    entries: Vec<Assumption>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assume(
        &mut self,
        object: impl Into<String>,
        property: impl Into<String>,
        value: impl ToString,
        remark: impl Into<String>,
    ) {
        self.entries.push(Assumption {
            object: object.into(),
            property: property.into(),
            value: value.to_string(),
            remark: remark.into(),
        });
    }

    /// Drop assumptions about objects that no longer exist.
    pub fn retain_objects(&mut self, mut exists: impl FnMut(&str) -> bool) {
        self.entries.retain(|e| exists(&e.object));
    }

    pub fn for_object<'a>(&'a self, object: &'a str) -> impl Iterator<Item = &'a Assumption> {
        self.entries.iter().filter(move |e| e.object == object)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assumption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
