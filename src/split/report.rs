//! Batch summary for deriving an ML catalog from a source catalog.

use serde::Serialize;
use std::fmt;

use crate::model::Split;

/// Outcome of [`MlCatalogBuilder::extend_from`](super::MlCatalogBuilder::extend_from).
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    /// Id of the ML catalog.
    pub catalog_id: String,
    /// Samples that produced a combined item.
    pub added: Vec<AddedSample>,
    /// Source pairs that produced nothing.
    pub skipped: Vec<SkippedSample>,
}

impl SplitReport {
    pub fn new(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            ..Default::default()
        }
    }

    /// Returns true if every source pair was carried over.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Ids of the source items that caused a pair to be skipped.
    pub fn skipped_ids(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.item_id.as_str()).collect()
    }

    pub fn count_for(&self, split: Split) -> usize {
        self.added.iter().filter(|a| a.split == split).count()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ML catalog '{}': {} sample(s) ({} train, {} test), {} skipped",
            self.catalog_id,
            self.added.len(),
            self.count_for(Split::Train),
            self.count_for(Split::Test),
            self.skipped.len()
        )?;

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", self.skipped.len())?;
            for sample in &self.skipped {
                writeln!(f, "  - [{}] {}: {}", sample.code, sample.item_id, sample.reason)?;
            }
        }

        Ok(())
    }
}

/// A combined item added to the ML catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AddedSample {
    pub id: String,
    pub split: Split,
}

/// A source pair that was not carried over.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedSample {
    /// The source item at fault.
    pub item_id: String,
    pub image_id: String,
    pub label_id: String,
    pub code: SplitIssueCode,
    pub reason: String,
}

/// Stable codes for skipped pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitIssueCode {
    /// A source item lacks the asset the combined item needs.
    MissingAsset,
    /// The source pair is not filed under a train or test catalog.
    UnassignedSplit,
}

impl fmt::Display for SplitIssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitIssueCode::MissingAsset => write!(f, "missing_asset"),
            SplitIssueCode::UnassignedSplit => write!(f, "unassigned_split"),
        }
    }
}
