//! Catalog summary types and terminal formatting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::model::BBox;

/// The result of inspecting a catalog.
#[derive(Clone, Debug, Serialize)]
pub struct CatalogSummary {
    pub id: String,
    pub href: String,
    pub counts: NodeCounts,
    /// One entry per collection, in tree order.
    pub collections: Vec<CollectionSummary>,
    /// Every node in pre-order.
    pub tree: Vec<TreeEntry>,
}

/// Node and metadata totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeCounts {
    pub catalogs: usize,
    pub collections: usize,
    pub items: usize,
    pub assets: usize,
    /// Typed links (`source`, `derived_from`, ...); structural links are
    /// not counted.
    pub links: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    /// Items transitively under the collection.
    pub items: usize,
    pub bbox: Option<BBox>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub depth: usize,
    pub kind: &'static str,
    pub id: String,
    pub href: String,
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Catalog '{}' ({})", self.id, self.href)?;
        writeln!(f)?;

        let c = &self.counts;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Catalogs:     {:>6}", c.catalogs)?;
        writeln!(f, "  Collections:  {:>6}", c.collections)?;
        writeln!(f, "  Items:        {:>6}", c.items)?;
        writeln!(f, "  Assets:       {:>6}", c.assets)?;
        writeln!(f, "  Typed links:  {:>6}", c.links)?;

        if !self.collections.is_empty() {
            writeln!(f)?;
            writeln!(f, "Extents:")?;
            for collection in &self.collections {
                let bbox = collection
                    .bbox
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "unbounded".to_string());
                writeln!(
                    f,
                    "  {:<16} {:>4} item(s)  bbox {}  time {} .. {}",
                    collection.id,
                    collection.items,
                    bbox,
                    format_time(collection.start),
                    format_time(collection.end)
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Tree:")?;
        for entry in &self.tree {
            let marker = if entry.kind == "item" { '-' } else { '*' };
            writeln!(
                f,
                "{}{} <{} id={}>",
                "    ".repeat(entry.depth),
                marker,
                capitalize(entry.kind),
                entry.id
            )?;
        }

        Ok(())
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "open".to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
