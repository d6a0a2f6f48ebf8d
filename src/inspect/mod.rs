//! Catalog inspection.
//!
//! Produces a [`CatalogSummary`]: node and metadata totals, the extent of
//! every collection, and an indented tree of the whole catalog.

mod report;

pub use report::{CatalogSummary, CollectionSummary, NodeCounts, TreeEntry};

use crate::catalog::Catalog;
use crate::model::NodeKind;

/// Summarizes `catalog`.
pub fn inspect_catalog(catalog: &Catalog) -> CatalogSummary {
    let mut counts = NodeCounts::default();
    let mut collections = Vec::new();
    let mut tree = Vec::with_capacity(catalog.len());

    for (depth, id) in catalog.walk() {
        let node = catalog.node(id);
        counts.links += catalog.links(id).len();

        match &node.kind {
            NodeKind::Catalog => counts.catalogs += 1,
            NodeKind::Collection(collection) => {
                counts.collections += 1;
                collections.push(CollectionSummary {
                    id: node.id.clone(),
                    items: catalog.items_under(id).len(),
                    bbox: collection.extent.spatial.bbox,
                    start: collection.extent.temporal.start,
                    end: collection.extent.temporal.end,
                });
            }
            NodeKind::Item(item) => {
                counts.items += 1;
                counts.assets += item.assets.len();
            }
        }

        tree.push(TreeEntry {
            depth,
            kind: node.kind_name(),
            id: node.id.clone(),
            href: node.href.clone(),
        });
    }

    let root = catalog.node(catalog.root());
    CatalogSummary {
        id: root.id.clone(),
        href: root.href.clone(),
        counts,
        collections,
        tree,
    }
}
