//! Catalog nodes and the metadata attached to them.
//!
//! Every node in a catalog tree is a [`Node`]: shared identity fields plus a
//! [`NodeKind`] payload. Structural relations (parent/child) and typed links
//! are not stored on the node; the owning [`Catalog`](crate::catalog::Catalog)
//! keeps them in lookup tables keyed by [`NodeId`](super::NodeId).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::bbox::BBox;
use super::extent::Extent;
use super::geometry::Geometry;
use super::ids::NodeId;

/// Free-form STAC properties.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A node in the catalog tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Identifier, unique among the node's siblings.
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Self-location. Assigned by the catalog when the node is attached.
    pub href: String,
    /// STAC extension schema URIs the node's document declares.
    pub extensions: Vec<String>,
    pub kind: NodeKind,
}

/// Variant-specific payload of a [`Node`].
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure container, no extent of its own.
    Catalog,
    /// Container with an aggregated extent.
    Collection(CollectionData),
    /// Leaf sample.
    Item(ItemData),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionData {
    pub extent: Extent,
    pub license: String,
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemData {
    pub geometry: Geometry,
    pub bbox: BBox,
    pub datetime: Option<DateTime<Utc>>,
    pub properties: Properties,
    pub assets: BTreeMap<String, Asset>,
}

impl Node {
    /// A catalog node. The href is assigned when the node is attached.
    pub fn catalog(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(id, Some(description.into()), NodeKind::Catalog)
    }

    /// A collection node with the given (usually placeholder) extent.
    pub fn collection(
        id: impl Into<String>,
        description: impl Into<String>,
        extent: Extent,
    ) -> Self {
        Self::new(
            id,
            Some(description.into()),
            NodeKind::Collection(CollectionData {
                extent,
                license: "proprietary".to_string(),
                properties: Properties::new(),
            }),
        )
    }

    /// An item node whose geometry is the rectangle covering `bbox`.
    pub fn item(id: impl Into<String>, bbox: BBox, datetime: Option<DateTime<Utc>>) -> Self {
        Self::new(
            id,
            None,
            NodeKind::Item(ItemData {
                geometry: Geometry::from_bbox(&bbox),
                bbox,
                datetime,
                properties: Properties::new(),
                assets: BTreeMap::new(),
            }),
        )
    }

    fn new(id: impl Into<String>, description: Option<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            title: None,
            description,
            href: String::new(),
            extensions: Vec::new(),
            kind,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declares a STAC extension schema, ignoring duplicates.
    pub fn with_extension(mut self, uri: impl Into<String>) -> Self {
        self.add_extension(uri);
        self
    }

    pub fn add_extension(&mut self, uri: impl Into<String>) {
        let uri = uri.into();
        if !self.extensions.contains(&uri) {
            self.extensions.push(uri);
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self.kind, NodeKind::Item(_))
    }

    pub fn as_item(&self) -> Option<&ItemData> {
        match &self.kind {
            NodeKind::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut ItemData> {
        match &mut self.kind {
            NodeKind::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionData> {
        match &self.kind {
            NodeKind::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut CollectionData> {
        match &mut self.kind {
            NodeKind::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Short kind label used in logs and reports.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Catalog => "catalog",
            NodeKind::Collection(_) => "collection",
            NodeKind::Item(_) => "item",
        }
    }
}

impl ItemData {
    /// Union of the geometry bounds and the declared bbox.
    pub fn footprint(&self) -> BBox {
        match self.geometry.bounds() {
            Some(bounds) => bounds.union(&self.bbox),
            None => self.bbox,
        }
    }
}

/// A raw data file referenced by an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_type: Option<MediaType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Asset {
    pub fn new(href: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            href: href.into(),
            title: None,
            media_type: Some(media_type),
            roles: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// Media types the catalog emits. Anything else round-trips via `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    GeoTiff,
    GeoJson,
    Json,
    Other(String),
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::GeoTiff => "image/tiff; application=geotiff",
            MediaType::GeoJson => "application/geo+json",
            MediaType::Json => "application/json",
            MediaType::Other(s) => s,
        }
    }
}

impl FromStr for MediaType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "image/tiff; application=geotiff" => MediaType::GeoTiff,
            "application/geo+json" => MediaType::GeoJson,
            "application/json" => MediaType::Json,
            other => MediaType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_else(|never: std::convert::Infallible| match never {}))
    }
}

/// Relation type of a link.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Root,
    Parent,
    Child,
    Item,
    Collection,
    SelfLink,
    /// Provenance: this node was derived from the target.
    DerivedFrom,
    /// Label extension: imagery the labels were traced from.
    Source,
    Other(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Relation::Root => "root",
            Relation::Parent => "parent",
            Relation::Child => "child",
            Relation::Item => "item",
            Relation::Collection => "collection",
            Relation::SelfLink => "self",
            Relation::DerivedFrom => "derived_from",
            Relation::Source => "source",
            Relation::Other(s) => s,
        }
    }

    /// Relations the catalog derives from its parent/child tables rather
    /// than storing as typed links.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Relation::Root
                | Relation::Parent
                | Relation::Child
                | Relation::Item
                | Relation::Collection
                | Relation::SelfLink
        )
    }
}

impl From<&str> for Relation {
    fn from(s: &str) -> Self {
        match s {
            "root" => Relation::Root,
            "parent" => Relation::Parent,
            "child" => Relation::Child,
            "item" => Relation::Item,
            "collection" => Relation::Collection,
            "self" => Relation::SelfLink,
            "derived_from" => Relation::DerivedFrom,
            "source" => Relation::Source,
            other => Relation::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Relation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Relation::from(s.as_str()))
    }
}

/// Where a link points.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    /// A node in the same catalog.
    Node(NodeId),
    /// A location outside this catalog (e.g. an item in a source catalog).
    Href(String),
}

/// A typed, one-way reference from one node to another.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub rel: Relation,
    pub target: LinkTarget,
    pub media_type: Option<MediaType>,
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: Relation, target: LinkTarget, media_type: Option<MediaType>) -> Self {
        Self {
            rel,
            target,
            media_type,
            title: None,
        }
    }
}

/// Train/test membership of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Id of the sub-catalog or collection the split is filed under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Split::Train => "Training Split",
            Split::Test => "Testing Split",
        }
    }

    pub const ALL: [Split; 2] = [Split::Train, Split::Test];
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" | "training" => Ok(Split::Train),
            "test" | "testing" | "validation" | "val" => Ok(Split::Test),
            other => Err(format!("unknown split '{}' (expected train or test)", other)),
        }
    }
}

/// Label extension schema declared by label-bearing items.
pub const LABEL_EXTENSION: &str = "https://stac-extensions.github.io/label/v1.0.1/schema.json";

/// Whether labels are vector features or a raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    #[default]
    Vector,
    Raster,
}

/// A named set of class values (STAC `label:classes` entry).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelClasses {
    /// Property the classes are read from; `None` for raster or
    /// single-property labels.
    pub name: Option<String>,
    pub classes: Vec<String>,
}

impl LabelClasses {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Descriptive metadata of a label-bearing collection or item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSemantics {
    #[serde(rename = "type", default)]
    pub label_type: LabelType,

    #[serde(default)]
    pub tasks: Vec<String>,

    #[serde(default)]
    pub classes: Vec<LabelClasses>,

    #[serde(default)]
    pub description: Option<String>,
}

impl LabelSemantics {
    /// Writes the `label:*` properties into `properties`.
    pub fn apply(&self, properties: &mut Properties) {
        use serde_json::{json, Value};

        properties.insert("label:type".into(), json!(self.label_type));
        properties.insert("label:tasks".into(), json!(self.tasks));
        properties.insert("label:classes".into(), json!(self.classes));
        properties.insert("label:properties".into(), Value::Null);
        if let Some(description) = &self.description {
            properties.insert("label:description".into(), json!(description));
        }
    }

    /// Reads `label:*` properties back. Returns `None` when no label
    /// properties are present.
    pub fn from_properties(properties: &Properties) -> Option<Self> {
        let label_type = properties.get("label:type");
        let classes = properties.get("label:classes");
        if label_type.is_none() && classes.is_none() {
            return None;
        }

        Some(Self {
            label_type: label_type
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default(),
            tasks: properties
                .get("label:tasks")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default(),
            classes: classes
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default(),
            description: properties
                .get("label:description")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }

    /// All class names across class sets, in declaration order.
    pub fn class_names(&self) -> Vec<String> {
        self.classes
            .iter()
            .flat_map(|set| set.classes.iter().cloned())
            .collect()
    }
}
