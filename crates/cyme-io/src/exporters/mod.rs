//! GLM model writer and the artifacts written next to it.

pub mod assumptions;
pub mod dot;
pub mod glm;
pub mod metadata;

pub use assumptions::{export_assumptions_csv, export_assumptions_glm};
pub use dot::export_to_dot;
pub use glm::{export_to_glm, export_to_glm_string, GlmDocument};
pub use metadata::{cyme_timestamp, GlmMetadata};
