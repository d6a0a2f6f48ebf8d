//! Data model for ML sample catalogs.
//!
//! The model mirrors the STAC object hierarchy: catalogs contain collections
//! and sub-catalogs, collections carry an aggregated [`Extent`], and items
//! are the leaf samples carrying geometry, assets and timestamps.
//!
//! # Design Principles
//!
//! 1. **One node type**: catalogs, collections and items share a single
//!    [`Node`] type with a [`NodeKind`] payload, consumed by pattern matching.
//!
//! 2. **Relations live outside nodes**: nodes never hold references to each
//!    other. Parent/child relations and typed [`Link`]s are kept by the owning
//!    [`Catalog`](crate::catalog::Catalog) and addressed by [`NodeId`].
//!
//! 3. **Pure aggregation**: [`aggregate`] and friends have no hidden state.
//!
//! # Example
//!
//! ```
//! use mlstac::model::{BBox, Node};
//!
//! let node = Node::item("img205", BBox::from_xyxy(0.0, 0.0, 1.0, 1.0), None);
//! assert_eq!(node.kind_name(), "item");
//! ```

mod bbox;
pub mod extent;
mod geometry;
mod ids;
mod node;

// Re-export core types for convenient access
pub use bbox::BBox;
pub use extent::{aggregate, aggregate_spatial, aggregate_temporal};
pub use extent::{Extent, SpatialExtent, TemporalExtent, WORLD_BBOX};
pub use geometry::{Geometry, Position};
pub use ids::NodeId;
pub use node::{
    Asset, CollectionData, ItemData, LabelClasses, LabelSemantics, LabelType, Link, LinkTarget,
    MediaType, Node, NodeKind, Properties, Relation, Split, LABEL_EXTENSION,
};
