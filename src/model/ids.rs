//! Arena handles for catalog nodes.
//!
//! A [`NodeId`] is only meaningful for the [`Catalog`](crate::catalog::Catalog)
//! that issued it. Node *names* (the STAC `id` strings) live on the node
//! itself and are unique only among siblings.

use std::fmt;

/// Stable index of a node inside a catalog arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the underlying arena index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering_follows_insertion() {
        assert!(NodeId(1) < NodeId(2));
        assert_eq!(NodeId(3).index(), 3);
    }

    #[test]
    fn test_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(NodeId(1));
        set.insert(NodeId(2));
        set.insert(NodeId(1)); // duplicate
        assert_eq!(set.len(), 2);
    }
}
