//! Object graph for one network.
//!
//! Objects are stored in creation order, which is also the order they are
//! written to the GLM file. Edges are implicit: an object with `from` and `to`
//! properties connects the two named nodes, and `parent` attaches a node or
//! load to another bus.
//!
//! Link placeholders are replaced by concrete devices through
//! [`ObjectGraph::upsert`]: the placeholder is consumed, the device gets its own
//! class-prefixed name and the old link name stays reachable as an alias.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{CymeError, CymeResult};
use crate::naming::NameRegistry;
use crate::object::{GlmObject, ObjectClass, Properties, Value};

/// How properties of an existing object are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Later values replace earlier ones
    Overwrite,
    /// A different value for an existing key is a merge conflict
    Strict,
}

#[derive(Debug, Clone)]
struct Entry {
    object: GlmObject,
    refcount: usize,
}

/// Named objects of one network.
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    slots: Vec<Option<Entry>>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
}

/// Undirected multigraph view of the objects that have both `from` and `to`.
///
/// Node weights are node names, edge weights are the names of the objects
/// connecting them. Nodes are added for every endpoint even when the named
/// node object does not exist.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub graph: UnGraph<String, String>,
    pub nodes: HashMap<String, NodeIndex>,
}

impl Topology {
    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow link aliases to the name the object is stored under.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        // Aliases never chain deeper than the number of reclassifications.
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) if !self.index.contains_key(current) => current = next,
                _ => break,
            }
        }
        current
    }

    /// Create or merge an object and return the name it is stored under.
    ///
    /// When `name` refers to a link placeholder and `class` supersedes links,
    /// the placeholder is consumed and the object is stored under
    /// `names.name(source_id, class)` instead.
    pub fn upsert(
        &mut self,
        names: &mut NameRegistry,
        class: ObjectClass,
        name: &str,
        source_id: &str,
        properties: Properties,
        mode: MergeMode,
    ) -> CymeResult<String> {
        let target = self.resolve(name).to_string();
        let Some(&slot) = self.index.get(&target) else {
            let mut object = GlmObject::new(target.clone(), class, source_id);
            object.properties = properties.without_unset();
            self.insert(object);
            return Ok(target);
        };

        let reclassify = match &self.slots[slot] {
            Some(entry) => {
                if mode == MergeMode::Strict {
                    check_conflicts(&entry.object, &properties)?;
                }
                entry.object.class == ObjectClass::Link && class.supersedes_link()
            }
            None => false,
        };

        if reclassify {
            let new_name = names.name(source_id, Some(class.as_str()));
            if new_name != target && self.index.contains_key(&new_name) {
                return Err(CymeError::UnsupportedDevice {
                    device: source_id.to_string(),
                    reason: format!("object name '{new_name}' is already in use"),
                });
            }
            let Some(entry) = self.slots[slot].take() else {
                return Err(CymeError::Other(format!("object '{target}' vanished")));
            };
            let mut object = entry.object.reclassify(class, new_name.clone());
            merge_properties(&mut object.properties, properties);
            self.index.remove(&target);
            self.index.insert(new_name.clone(), slot);
            self.slots[slot] = Some(Entry {
                object,
                refcount: 1,
            });
            if new_name != target {
                self.aliases.insert(target, new_name.clone());
            }
            return Ok(new_name);
        }

        if let Some(entry) = self.slots[slot].as_mut() {
            merge_properties(&mut entry.object.properties, properties);
            entry.object.class = class;
            entry.refcount += 1;
        }
        Ok(target)
    }

    fn insert(&mut self, object: GlmObject) {
        self.index.insert(object.name.clone(), self.slots.len());
        self.slots.push(Some(Entry {
            object,
            refcount: 1,
        }));
    }

    /// Release one reference to an object; it is purged when the count
    /// reaches zero. Aliases are not followed, so deleting a placeholder that
    /// was already reclassified does nothing. Returns true when purged.
    pub fn delete(&mut self, name: &str) -> bool {
        let Some(&slot) = self.index.get(name) else {
            return false;
        };
        let purge = match self.slots[slot].as_mut() {
            Some(entry) if entry.refcount > 1 => {
                entry.refcount -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if purge {
            self.slots[slot] = None;
            self.index.remove(name);
        }
        purge
    }

    /// Purge an object regardless of its reference count.
    pub fn remove(&mut self, name: &str) -> Option<GlmObject> {
        let slot = self.index.remove(name)?;
        self.slots[slot].take().map(|entry| entry.object)
    }

    pub fn get(&self, name: &str) -> Option<&GlmObject> {
        let slot = *self.index.get(self.resolve(name))?;
        self.slots[slot].as_ref().map(|entry| &entry.object)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GlmObject> {
        let resolved = self.resolve(name).to_string();
        let slot = *self.index.get(&resolved)?;
        self.slots[slot].as_mut().map(|entry| &mut entry.object)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn refcount(&self, name: &str) -> usize {
        self.index
            .get(self.resolve(name))
            .and_then(|&slot| self.slots[slot].as_ref())
            .map(|entry| entry.refcount)
            .unwrap_or(0)
    }

    /// Set one property on an existing object. Returns false if the object
    /// does not exist.
    pub fn set_property(&mut self, name: &str, key: &str, value: impl Into<Value>) -> bool {
        match self.get_mut(name) {
            Some(object) => {
                object.properties.set(key, value);
                true
            }
            None => false,
        }
    }

    /// Objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &GlmObject> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|entry| &entry.object))
    }

    /// Names of objects matching a predicate, in creation order.
    pub fn names_where(&self, mut pred: impl FnMut(&GlmObject) -> bool) -> Vec<String> {
        self.iter()
            .filter(|object| pred(object))
            .map(|object| object.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Object count per class name.
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for object in self.iter() {
            *counts.entry(object.class.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn topology(&self) -> Topology {
        let mut topology = Topology::default();
        for object in self.iter() {
            if let (Some(from), Some(to)) = (object.from_node(), object.to_node()) {
                let a = topology.node(from);
                let b = topology.node(to);
                topology.graph.add_edge(a, b, object.name.clone());
            }
        }
        topology
    }
}

fn check_conflicts(existing: &GlmObject, incoming: &Properties) -> CymeResult<()> {
    for (key, value) in incoming.iter() {
        if value.is_unset() {
            continue;
        }
        if let Some(current) = existing.properties.get(key) {
            if current.to_string() != value.to_string() {
                return Err(CymeError::MergeConflict {
                    object: existing.name.clone(),
                    property: key.to_string(),
                    existing: current.to_string(),
                    incoming: value.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn merge_properties(target: &mut Properties, incoming: Properties) {
    for (key, value) in incoming {
        if value.is_unset() {
            target.remove(&key);
        } else {
            target.set(&key, value);
        }
    }
}
