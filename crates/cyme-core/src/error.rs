//! Error types shared by the conversion pipeline.
//!
//! [`CymeError`] covers every failure the builder can report. Errors are split
//! into two scopes:
//!
//! - **device-level** errors (missing equipment, merge conflicts, malformed
//!   cells) are caught by the caller of a mapper, logged as warnings and the
//!   device is skipped;
//! - **network-level** errors (ambiguous head node, unsupported duplicate
//!   topology, unsupported model version) abort only the network being
//!   converted.
//!
//! # Example
//!
//! ```
//! use cyme_core::{CymeError, CymeResult};
//!
//! fn lookup(found: bool) -> CymeResult<()> {
//!     if found {
//!         Ok(())
//!     } else {
//!         Err(CymeError::EquipmentLookup {
//!             table: "eqtransformer".into(),
//!             id: "XFMR-1".into(),
//!         })
//!     }
//! }
//!
//! assert!(lookup(false).unwrap_err().is_device_level());
//! ```

use thiserror::Error;

/// Unified error type for the CYME conversion pipeline.
#[derive(Error, Debug)]
pub enum CymeError {
    /// I/O errors (file access, output creation)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input files
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table needed by a mapper is absent from the input directory
    #[error("required table '{0}' is not available")]
    MissingTable(String),

    /// No row matched a single-record lookup
    #[error("no row in '{table}' where {column} = '{id}'")]
    NotFound {
        table: String,
        column: String,
        id: String,
    },

    /// More than one row matched a single-record lookup
    #[error("{count} rows in '{table}' where {column} = '{id}', expected exactly one")]
    Ambiguous {
        table: String,
        column: String,
        id: String,
        count: usize,
    },

    /// A cell is missing or cannot be parsed into the requested type
    #[error("table '{table}' row '{id}' column '{column}': {reason}")]
    Field {
        table: String,
        id: String,
        column: String,
        reason: String,
    },

    /// Equipment referenced by a device is absent from the equipment tables
    #[error("equipment '{id}' not found in '{table}'")]
    EquipmentLookup { table: String, id: String },

    /// Two writers disagree on the value of a property
    #[error("object '{object}' property '{property}={existing}' merge conflicts with '{property}={incoming}'")]
    MergeConflict {
        object: String,
        property: String,
        existing: String,
        incoming: String,
    },

    /// An object refers to a name that does not exist and cannot be repaired
    #[error("object '{object}' references missing object '{target}' through '{property}'")]
    UnresolvedReference {
        object: String,
        property: String,
        target: String,
    },

    /// Device configuration the builder has no mapping for
    #[error("unsupported device '{device}': {reason}")]
    UnsupportedDevice { device: String, reason: String },

    /// Equipment or device with a zero electrical rating
    #[error("device '{device}' has zero {rating}")]
    ZeroRating { device: String, rating: String },

    /// More than one head node declared for a network
    #[error("network '{network}' declares {count} head nodes, expected at most one")]
    AmbiguousHeadNode { network: String, count: usize },

    /// Parallel edges without a device type that can win deduplication
    #[error("unsupported duplicate topology between '{from}' and '{to}' (classes: {classes})")]
    UnsupportedDuplicateTopology {
        from: String,
        to: String,
        classes: String,
    },

    /// Network model version without a matching extractor
    #[error("CYME model version '{0}' is not supported")]
    UnsupportedVersion(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl CymeError {
    /// True for errors that only invalidate the device being mapped.
    pub fn is_device_level(&self) -> bool {
        matches!(
            self,
            CymeError::MissingTable(_)
                | CymeError::NotFound { .. }
                | CymeError::Ambiguous { .. }
                | CymeError::Field { .. }
                | CymeError::EquipmentLookup { .. }
                | CymeError::MergeConflict { .. }
                | CymeError::UnsupportedDevice { .. }
                | CymeError::ZeroRating { .. }
        )
    }

    /// True for errors that abort the conversion of one network.
    pub fn is_network_fatal(&self) -> bool {
        matches!(
            self,
            CymeError::AmbiguousHeadNode { .. }
                | CymeError::UnsupportedDuplicateTopology { .. }
                | CymeError::UnsupportedVersion(_)
                | CymeError::UnresolvedReference { .. }
        )
    }

    /// Short category tag used when the error is recorded as a diagnostic.
    pub fn category(&self) -> &'static str {
        match self {
            CymeError::Io(_) => "io",
            CymeError::Parse(_) => "parse",
            CymeError::Config(_) => "config",
            CymeError::MissingTable(_) => "missing_table",
            CymeError::NotFound { .. } | CymeError::Ambiguous { .. } => "lookup",
            CymeError::Field { .. } => "field",
            CymeError::EquipmentLookup { .. } => "equipment",
            CymeError::MergeConflict { .. } => "merge_conflict",
            CymeError::UnresolvedReference { .. } => "reference",
            CymeError::UnsupportedDevice { .. } => "unsupported_device",
            CymeError::ZeroRating { .. } => "zero_rating",
            CymeError::AmbiguousHeadNode { .. } => "head_node",
            CymeError::UnsupportedDuplicateTopology { .. } => "duplicate_topology",
            CymeError::UnsupportedVersion(_) => "version",
            CymeError::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Results using CymeError.
pub type CymeResult<T> = Result<T, CymeError>;

impl From<anyhow::Error> for CymeError {
    fn from(err: anyhow::Error) -> Self {
        CymeError::Other(err.to_string())
    }
}

impl From<String> for CymeError {
    fn from(s: String) -> Self {
        CymeError::Other(s)
    }
}

impl From<&str> for CymeError {
    fn from(s: &str) -> Self {
        CymeError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CymeError::MergeConflict {
            object: "CA_1".into(),
            property: "phases".into(),
            existing: "A".into(),
            incoming: "B".into(),
        };
        let text = err.to_string();
        assert!(text.contains("merge conflicts"));
        assert!(text.contains("phases=A"));
        assert!(text.contains("phases=B"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CymeError = io_err.into();
        assert!(matches!(err, CymeError::Io(_)));
    }

    #[test]
    fn test_scopes_are_disjoint() {
        let device = CymeError::ZeroRating {
            device: "T1".into(),
            rating: "kVA rating".into(),
        };
        assert!(device.is_device_level());
        assert!(!device.is_network_fatal());

        let network = CymeError::AmbiguousHeadNode {
            network: "NET1".into(),
            count: 2,
        };
        assert!(network.is_network_fatal());
        assert!(!network.is_device_level());
        assert_eq!(network.category(), "head_node");
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CymeResult<()> {
            Err(CymeError::MissingTable("fuse".into()))
        }

        fn outer() -> CymeResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
