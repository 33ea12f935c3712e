//! # cyme-io: CYME table input and GridLAB-D output
//!
//! Reads a CYME database export (one CSV file per table, as produced by
//! `mdb-export`) into an indexed [`importers::TableStore`], and writes
//! converted networks as GLM models plus their side artifacts.
//!
//! ## Design Philosophy
//!
//! **Loud lookups**: typed row accessors report the table, row id and column
//! of a missing or malformed cell, so a skipped device can be traced back to
//! the exact record.
//!
//! **Thin writers**: exporters only serialize. Every decision about which
//! objects exist and what they contain is made by the conversion pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cyme_io::importers::TableStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = TableStore::load(std::path::Path::new("data/feeder"))?;
//!     for row in store.find("network", &[])? {
//!         println!("network {}", row.id());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! ### Importers ([`importers`])
//! - [`importers::TableStore`] - CSV directory loading, filtered lookups
//! - [`importers::read_modifications`] - `object,property,value` files
//!
//! ### Exporters ([`exporters`])
//! - [`exporters::export_to_glm`] - GLM model with header defines
//! - [`exporters::export_assumptions_csv`] / [`exporters::export_assumptions_glm`]
//! - [`exporters::export_to_dot`] - Graphviz network map
//!
//! ## Error Handling
//! Functions touching the filesystem return `anyhow::Result` with the path in
//! the context; table lookups return `cyme_core::CymeResult` so callers can
//! tell a missing table from a missing row.

pub mod exporters;
pub mod importers;

pub use exporters::{GlmDocument, GlmMetadata};
pub use importers::{Row, Table, TableStore, REQUIRED_TABLES};
