//! # cyme-core: object model for CYME to GridLAB-D conversion
//!
//! Provides the data structures shared by the table readers, the conversion
//! pipeline and the GLM writer.
//!
//! ## Design Philosophy
//!
//! A converted network is a flat registry of **named objects** rather than a
//! typed graph: GridLAB-D objects refer to each other by name (`from`, `to`,
//! `parent`, `configuration`), and the conversion repeatedly creates, merges,
//! renames and deletes objects while it resolves the CYME topology. Edges are
//! recovered on demand as a petgraph multigraph ([`ObjectGraph::topology`])
//! when a pass needs graph queries.
//!
//! ## Quick Start
//!
//! ```rust
//! use cyme_core::*;
//!
//! let mut names = NameRegistry::new();
//! let mut graph = ObjectGraph::new();
//!
//! let link = names.name("SW1", Some("link"));
//! graph.upsert(
//!     &mut names,
//!     ObjectClass::Link,
//!     &link,
//!     "SW1",
//!     Properties::new().with("from", "ND_1").with("to", "ND_2").with("phases", "A"),
//!     MergeMode::Overwrite,
//! )?;
//!
//! // the switch mapper replaces the placeholder
//! let switch = graph.upsert(
//!     &mut names,
//!     ObjectClass::Switch,
//!     &link,
//!     "SW1",
//!     Properties::new().with("phase_A_state", "CLOSED"),
//!     MergeMode::Overwrite,
//! )?;
//! assert_eq!(switch, "SW_SW1");
//! # Ok::<(), CymeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`phase`] - phase bit-sets and CYME phase codes
//! - [`naming`] - class prefixes and name sanitizing
//! - [`object`] - object classes, property values
//! - [`graph`] - the per-network object registry
//! - [`assumptions`] - substituted values kept for audit
//! - [`diagnostics`] - warnings and errors collected during conversion
//! - [`units`] - unit newtypes and `%g` number formatting

pub mod assumptions;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod graph_utils;
pub mod naming;
pub mod object;
pub mod phase;
pub mod units;

pub use assumptions::{Assumption, Assumptions};
pub use diagnostics::{ConversionStats, DiagnosticIssue, Diagnostics, Severity};
pub use error::{CymeError, CymeResult};
pub use graph::{MergeMode, ObjectGraph, Topology};
pub use graph_utils::{export_graph, topology_stats, TopologyStats};
pub use naming::NameRegistry;
pub use object::{GlmObject, ObjectClass, Properties, Value};
pub use phase::{Phase, PhaseSet};
