//! Readers for CYME table exports and modification files.

pub mod modify;
pub mod tables;

pub use modify::{read_modifications, resolve_within, Modification, ModificationSet};
pub use tables::{table_name, Row, Table, TableStore, CORE_TABLES, REQUIRED_TABLES};
