//! Diagnostics collected while converting a CYME database.
//!
//! Every skipped device, repaired reference and substituted value ends up here
//! so the caller can report warning and error counts per network and per run,
//! independently of how logging is filtered.
//!
//! # Example
//!
//! ```
//! use cyme_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("missing_table", "table 'fuse' is not available");
//! diag.add_error_with_entity("head_node", "two head nodes declared", "NET1");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CymeError;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Conversion continued (device skipped, value defaulted, node synthesized)
    Warning,
    /// A network could not be converted
    Error,
}

/// A single diagnostic issue encountered during conversion
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "merge_conflict", "reference", "zero_rating")
    pub category: String,
    pub message: String,
    /// Device, node or object the issue is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Network being converted when the issue was raised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
            network: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}]", severity, self.category)?;
        if let Some(network) = &self.network {
            write!(f, " {}:", network)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for one network or a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    /// Record an error that aborted the conversion of a network.
    pub fn add_network_failure(&mut self, network: &str, err: &CymeError) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Error, err.category(), err.to_string())
                .with_network(network),
        );
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    // =========================================================================
    // Utility Methods
    // =========================================================================

    /// Merge another diagnostics into this one, tagging untagged issues with
    /// the network they came from.
    pub fn merge_network(&mut self, network: &str, other: Diagnostics) {
        self.issues.extend(other.issues.into_iter().map(|mut issue| {
            if issue.network.is_none() {
                issue.network = Some(network.to_string());
            }
            issue
        }));
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        format!(
            "{} warning{}, {} error{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
            errors,
            if errors == 1 { "" } else { "s" }
        )
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

// ============================================================================
// Conversion statistics
// ============================================================================

/// Counters describing what the builder did to one network.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Final object count per class
    pub objects: BTreeMap<String, usize>,
    pub mapped_devices: usize,
    pub skipped_devices: usize,
    pub synthesized_nodes: usize,
    pub collapsed_links: usize,
    pub removed_duplicates: usize,
    pub assumptions: usize,
}

impl ConversionStats {
    pub fn object_count(&self) -> usize {
        self.objects.values().sum()
    }

    pub fn class_count(&self, class: &str) -> usize {
        self.objects.get(class).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} objects ({} devices mapped, {} skipped, {} nodes synthesized, {} links collapsed, {} duplicates removed, {} assumptions)",
            self.object_count(),
            self.mapped_devices,
            self.skipped_devices,
            self.synthesized_nodes,
            self.collapsed_links,
            self.removed_duplicates,
            self.assumptions
        )
    }
}
