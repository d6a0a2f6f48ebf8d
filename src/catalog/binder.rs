//! Attaching assets and typed links to nodes.
//!
//! Binding is a pure metadata operation: referenced files are never opened
//! or checked for existence.

use tracing::debug;

use super::Catalog;
use crate::error::CatalogError;
use crate::model::{Asset, Link, LinkTarget, MediaType, NodeId, Relation};

impl Catalog {
    /// Attaches `asset` to `item` under `key`.
    ///
    /// Re-binding an existing key replaces the previous asset, which is
    /// returned.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotAnItem`] if `item` is a container.
    pub fn bind_asset(
        &mut self,
        item: NodeId,
        key: impl Into<String>,
        asset: Asset,
    ) -> Result<Option<Asset>, CatalogError> {
        let key = key.into();
        debug!(item = %self.node(item).id, key = %key, href = %asset.href, "binding asset");
        Ok(self.item_mut(item)?.assets.insert(key, asset))
    }

    /// Appends a typed link from `from` to `target`.
    ///
    /// Links are one-way and never deduplicated: binding the same relation
    /// to the same target twice records two links.
    pub fn bind_link(
        &mut self,
        from: NodeId,
        rel: Relation,
        target: LinkTarget,
        media_type: Option<MediaType>,
    ) -> Result<(), CatalogError> {
        if let LinkTarget::Node(node) = &target {
            if self.get(*node).is_none() {
                return Err(CatalogError::InvalidId {
                    id: node.to_string(),
                    reason: "link target is not part of this catalog".to_string(),
                });
            }
        }

        debug!(from = %self.node(from).id, rel = %rel, "binding link");
        self.links_mut(from)
            .push(Link::new(rel, target, media_type));
        Ok(())
    }

    /// Typed links on `id` with relation `rel`.
    pub fn links_with<'a>(
        &'a self,
        id: NodeId,
        rel: &'a Relation,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links(id).iter().filter(move |link| &link.rel == rel)
    }

    /// Location a link points at, whichever form its target takes.
    pub fn link_href<'a>(&'a self, link: &'a Link) -> &'a str {
        match &link.target {
            LinkTarget::Node(node) => &self.node(*node).href,
            LinkTarget::Href(href) => href,
        }
    }
}
