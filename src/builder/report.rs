//! Build report types for batch catalog construction.
//!
//! This module provides structured reporting for pair ingestion, similar to
//! how `split::SplitReport` tracks the derived ML catalog.

use serde::Serialize;
use std::fmt;

use crate::model::Split;

/// Outcome of adding a batch of pairs to a catalog.
///
/// A report with no skipped pairs is a full success; otherwise the catalog
/// holds every processed pair and nothing of any skipped one.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildReport {
    /// Id of the catalog being built.
    pub catalog_id: String,
    /// Pairs that produced both items.
    pub processed: Vec<ProcessedPair>,
    /// Pairs that produced no items.
    pub skipped: Vec<SkippedPair>,
    /// Warnings and notes raised while building.
    pub issues: Vec<BuildIssue>,
}

impl BuildReport {
    /// Create a new empty report for the given catalog.
    pub fn new(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: BuildIssue) {
        self.issues.push(issue);
    }

    /// Returns true if every pair was processed.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Count of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == BuildSeverity::Warning)
            .count()
    }

    /// Number of processed pairs filed under `split`.
    pub fn count_for(&self, split: Option<Split>) -> usize {
        self.processed.iter().filter(|p| p.split == split).count()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Catalog '{}': {} pair(s) added ({} train, {} test, {} unsplit), {} skipped",
            self.catalog_id,
            self.processed.len(),
            self.count_for(Some(Split::Train)),
            self.count_for(Some(Split::Test)),
            self.count_for(None),
            self.skipped.len()
        )?;

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", self.skipped.len())?;
            for pair in &self.skipped {
                writeln!(f, "  - {} + {}: {}", pair.image_ref, pair.label_ref, pair.reason)?;
            }
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == BuildSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// A pair that was added to the catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessedPair {
    pub image_id: String,
    pub label_id: String,
    pub split: Option<Split>,
}

/// A pair that was rejected, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedPair {
    pub image_ref: String,
    pub label_ref: String,
    pub split: Option<Split>,
    pub code: BuildIssueCode,
    pub reason: String,
}

/// A single issue raised while building.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildIssue {
    pub severity: BuildSeverity,
    pub code: BuildIssueCode,
    pub message: String,
}

impl BuildIssue {
    /// Create a warning-level issue.
    pub fn warning(code: BuildIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: BuildSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue.
    pub fn info(code: BuildIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: BuildSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for build issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSeverity {
    /// Results may be incomplete or stale.
    Warning,
    /// Policy note, nothing is wrong.
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildIssueCode {
    /// The image's bounds could not be obtained; the pair was skipped.
    DataUnavailable,
    /// Operation out of phase: pairs added after finalize, or an empty
    /// catalog finalized. Extents may be meaningless until re-finalized.
    InvalidState,
    /// A split was requested but the catalog has no split sub-catalogs.
    SplitIgnored,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(split: Option<Split>) -> ProcessedPair {
        ProcessedPair {
            image_id: "img".into(),
            label_id: "lbl".into(),
            split,
        }
    }

    #[test]
    fn empty_report_is_complete() {
        let report = BuildReport::new("tiny");
        assert!(report.is_complete());
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn skipped_pair_makes_report_incomplete() {
        let mut report = BuildReport::new("tiny");
        report.skipped.push(SkippedPair {
            image_ref: "a.tif".into(),
            label_ref: "a.geojson".into(),
            split: Some(Split::Train),
            code: BuildIssueCode::DataUnavailable,
            reason: "unreadable".into(),
        });
        assert!(!report.is_complete());
        assert!(report.to_string().contains("a.tif + a.geojson: unreadable"));
    }

    #[test]
    fn counts_by_split() {
        let mut report = BuildReport::new("tiny");
        report.processed.push(processed(Some(Split::Train)));
        report.processed.push(processed(Some(Split::Train)));
        report.processed.push(processed(Some(Split::Test)));
        assert_eq!(report.count_for(Some(Split::Train)), 2);
        assert_eq!(report.count_for(Some(Split::Test)), 1);
        assert_eq!(report.count_for(None), 0);
        assert!(report.to_string().contains("3 pair(s) added (2 train, 1 test, 0 unsplit)"));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = BuildReport::new("tiny");
        report.add(BuildIssue::warning(
            BuildIssueCode::InvalidState,
            "finalized an empty catalog",
        ));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"catalog_id\":\"tiny\""));
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"code\":\"invalid_state\""));
    }
}
