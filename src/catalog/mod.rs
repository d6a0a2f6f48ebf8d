//! The catalog arena.
//!
//! A [`Catalog`] owns every node of one tree in a flat arena. Relations are
//! stored beside the nodes, indexed by [`NodeId`]:
//!
//! - `parents` / `children`: the tree structure
//! - `links`: typed links (`source`, `derived_from`, ...) per source node
//!
//! Nodes are only ever appended. Their locations are derived from their
//! parent's location when they are attached (see [`href`]).

pub mod binder;
pub mod href;

use tracing::debug;

use crate::error::CatalogError;
use crate::model::{Extent, ItemData, Link, Node, NodeId, NodeKind};

/// One catalog tree.
#[derive(Clone, Debug)]
pub struct Catalog {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
    links: Vec<Vec<Link>>,
}

impl Catalog {
    /// Creates a tree whose root is `root`, located at `href`.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotAContainer`] if `root` is an item, or
    /// [`CatalogError::InvalidId`] if its id is unusable.
    pub fn new(mut root: Node, href: impl Into<String>) -> Result<Self, CatalogError> {
        href::validate_id(&root.id)?;
        if !root.is_container() {
            return Err(CatalogError::NotAContainer {
                id: root.id,
                kind: "item",
            });
        }
        root.href = href.into();

        Ok(Self {
            nodes: vec![root],
            parents: vec![None],
            children: vec![Vec::new()],
            links: vec![Vec::new()],
        })
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A catalog always has its root, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different catalog and is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.0]
    }

    /// Typed links recorded on `id`, in insertion order.
    pub fn links(&self, id: NodeId) -> &[Link] {
        &self.links[id.0]
    }

    pub(crate) fn links_mut(&mut self, id: NodeId) -> &mut Vec<Link> {
        &mut self.links[id.0]
    }

    /// Iterates over all node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Finds the child of `parent` named `id`.
    pub fn find_child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.node(*child).id == id)
    }

    /// Follows a path of child ids from the root.
    pub fn find_path(&self, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, id| self.find_child(node, id))
    }

    /// Finds the node located at `href`.
    pub fn find_by_href(&self, href: &str) -> Option<NodeId> {
        self.ids().find(|id| self.node(*id).href == href)
    }

    /// Item payload of `id`.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotAnItem`] for containers.
    pub fn item(&self, id: NodeId) -> Result<&ItemData, CatalogError> {
        let node = self.node(id);
        node.as_item().ok_or_else(|| CatalogError::NotAnItem {
            id: node.id.clone(),
            kind: node.kind_name(),
        })
    }

    pub(crate) fn item_mut(&mut self, id: NodeId) -> Result<&mut ItemData, CatalogError> {
        let node = &mut self.nodes[id.0];
        let kind = node.kind_name();
        let name = node.id.clone();
        node.as_item_mut()
            .ok_or(CatalogError::NotAnItem { id: name, kind })
    }

    /// Slash-joined ids from the root to `id`, for messages.
    pub fn display_path(&self, id: NodeId) -> String {
        let mut parts = vec![self.node(id).id.as_str()];
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            parts.push(self.node(parent).id.as_str());
            cursor = self.parent(parent);
        }
        parts.reverse();
        parts.join("/")
    }

    /// Checks that a child named `id` could be attached under `parent`.
    ///
    /// # Errors
    /// [`CatalogError::InvalidId`], [`CatalogError::NotAContainer`] or
    /// [`CatalogError::DuplicateId`].
    pub fn check_vacant(&self, parent: NodeId, id: &str) -> Result<(), CatalogError> {
        href::validate_id(id)?;

        let parent_node = self.node(parent);
        if !parent_node.is_container() {
            return Err(CatalogError::NotAContainer {
                id: parent_node.id.clone(),
                kind: parent_node.kind_name(),
            });
        }

        if self.find_child(parent, id).is_some() {
            return Err(CatalogError::DuplicateId {
                parent: self.display_path(parent),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    /// Attaches `node` under `parent`, deriving its location from the
    /// parent's.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, CatalogError> {
        self.check_vacant(parent, &node.id)?;

        let dir = href::parent_dir(&self.node(parent).href).to_string();
        let location = match node.kind {
            NodeKind::Catalog => href::container_href(&dir, &node.id, href::CATALOG_FILE),
            NodeKind::Collection(_) => {
                href::container_href(&dir, &node.id, href::COLLECTION_FILE)
            }
            NodeKind::Item(_) => href::item_href(&dir, &node.id),
        };

        Ok(self.push(parent, node, location))
    }

    /// Attaches `node` under `parent` at an explicit location. Used when
    /// loading trees whose layout was chosen elsewhere.
    pub(crate) fn attach_at(
        &mut self,
        parent: NodeId,
        node: Node,
        location: String,
    ) -> Result<NodeId, CatalogError> {
        self.check_vacant(parent, &node.id)?;
        Ok(self.push(parent, node, location))
    }

    fn push(&mut self, parent: NodeId, mut node: Node, location: String) -> NodeId {
        node.href = location;
        let id = NodeId(self.nodes.len());
        debug!(
            kind = node.kind_name(),
            id = %node.id,
            href = %node.href,
            "attached node"
        );

        self.nodes.push(node);
        self.parents.push(Some(parent));
        self.children.push(Vec::new());
        self.links.push(Vec::new());
        self.children[parent.0].push(id);
        id
    }

    /// Pre-order walk from the root, yielding `(depth, id)`.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, self.root())];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for child in self.children(id).iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }

    /// All items transitively under `id`, in pre-order.
    pub fn items_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if current != id && self.node(current).as_item().is_some() {
                out.push(current);
            }
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Nearest collection ancestor of `id`.
    pub fn collection_of(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            if self.node(parent).as_collection().is_some() {
                return Some(parent);
            }
            cursor = self.parent(parent);
        }
        None
    }

    /// Ids of the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self.parent(parent);
        }
        out
    }

    /// Replaces the extent of a collection. No-op for other kinds.
    pub(crate) fn set_extent(&mut self, id: NodeId, extent: Extent) {
        if let Some(collection) = self.node_mut(id).as_collection_mut() {
            collection.extent = extent;
        }
    }
}
