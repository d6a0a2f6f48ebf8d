//! Construction of paired image and label items.
//!
//! A [`PairFactory`] turns one `(image file, label file)` reference pair into
//! two linked items inside a catalog:
//!
//! - an image item with a raster asset (`rgb` by default)
//! - a label item with a vector asset (`labels` by default), the label
//!   extension properties, and a `source` link back to the image item
//!
//! Both items share one bounding box and one timestamp. Construction is
//! all-or-nothing: every check that can fail runs before either item is
//! attached.

pub mod provider;

pub use provider::{BBoxProvider, PixelBoundsProvider, StaticBBoxProvider};

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

use crate::catalog::{href, Catalog};
use crate::error::{BBoxError, CatalogError};
use crate::model::{
    Asset, BBox, LabelSemantics, LinkTarget, MediaType, Node, NodeId, Relation, Split,
    LABEL_EXTENSION,
};

/// Derives an item id from a file reference.
pub trait IdStrategy {
    fn item_id(&self, file_ref: &str) -> String;
}

/// File name without its extension: `dir/img205.tif` → `img205`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileStem;

impl IdStrategy for FileStem {
    fn item_id(&self, file_ref: &str) -> String {
        Path::new(file_ref)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_ref.to_string())
    }
}

impl<F> IdStrategy for F
where
    F: Fn(&str) -> String,
{
    fn item_id(&self, file_ref: &str) -> String {
        self(file_ref)
    }
}

/// How one asset of a pair is described.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetTemplate {
    pub key: String,
    pub title: Option<String>,
    pub media_type: MediaType,
    pub roles: Vec<String>,
}

impl AssetTemplate {
    /// The raster chip that was labeled.
    pub fn image() -> Self {
        Self {
            key: "rgb".to_string(),
            title: Some("RGB Chip".to_string()),
            media_type: MediaType::GeoTiff,
            roles: vec!["data".to_string()],
        }
    }

    /// The GeoJSON feature collection of labels.
    pub fn labels() -> Self {
        Self {
            key: "labels".to_string(),
            title: Some("Labels FeatureCollection".to_string()),
            media_type: MediaType::GeoJson,
            roles: vec!["labels".to_string(), "labels-vector".to_string()],
        }
    }

    fn instantiate(&self, href: String) -> Asset {
        let mut asset = Asset::new(href, self.media_type.clone());
        asset.title = self.title.clone();
        asset.roles = self.roles.clone();
        asset
    }
}

/// One sample as supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct PairInput {
    pub image_ref: String,
    pub label_ref: String,
    pub split: Option<Split>,
    /// Bounds already known to the caller; skips the bbox provider.
    pub bbox: Option<BBox>,
}

impl PairInput {
    pub fn new(image_ref: impl Into<String>, label_ref: impl Into<String>) -> Self {
        Self {
            image_ref: image_ref.into(),
            label_ref: label_ref.into(),
            split: None,
            bbox: None,
        }
    }

    pub fn with_split(mut self, split: Split) -> Self {
        self.split = Some(split);
        self
    }

    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Where the two items of a pair are attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairSlots {
    pub image_parent: NodeId,
    pub label_parent: NodeId,
}

/// The two items created for one pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemPair {
    pub image: NodeId,
    pub label: NodeId,
}

/// Builds linked image/label item pairs.
pub struct PairFactory {
    pub image_asset: AssetTemplate,
    pub label_asset: AssetTemplate,
    pub label: LabelSemantics,
    /// Base URI asset hrefs are resolved against.
    pub asset_base_uri: Option<String>,
    /// Also record `derived_from` links in both directions.
    pub reciprocal_links: bool,
    id_strategy: Box<dyn IdStrategy>,
}

impl std::fmt::Debug for PairFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairFactory")
            .field("image_asset", &self.image_asset)
            .field("label_asset", &self.label_asset)
            .field("label", &self.label)
            .field("asset_base_uri", &self.asset_base_uri)
            .field("reciprocal_links", &self.reciprocal_links)
            .finish_non_exhaustive()
    }
}

impl Default for PairFactory {
    fn default() -> Self {
        Self::new(LabelSemantics::default())
    }
}

impl PairFactory {
    pub fn new(label: LabelSemantics) -> Self {
        Self {
            image_asset: AssetTemplate::image(),
            label_asset: AssetTemplate::labels(),
            label,
            asset_base_uri: None,
            reciprocal_links: false,
            id_strategy: Box::new(FileStem),
        }
    }

    pub fn with_asset_base_uri(mut self, base: impl Into<String>) -> Self {
        self.asset_base_uri = Some(base.into());
        self
    }

    pub fn with_id_strategy(mut self, strategy: impl IdStrategy + 'static) -> Self {
        self.id_strategy = Box::new(strategy);
        self
    }

    pub fn with_reciprocal_links(mut self, enabled: bool) -> Self {
        self.reciprocal_links = enabled;
        self
    }

    /// Item id the factory would assign to `file_ref`.
    pub fn item_id(&self, file_ref: &str) -> String {
        self.id_strategy.item_id(file_ref)
    }

    /// Creates and attaches the image and label items for `input`.
    ///
    /// # Errors
    /// - [`CatalogError::DataUnavailable`] if no finite bbox can be obtained
    /// - [`CatalogError::DuplicateId`] / [`CatalogError::InvalidId`] if either
    ///   derived id cannot be attached
    ///
    /// On error the catalog is left unchanged.
    pub fn make_pair<P: BBoxProvider + ?Sized>(
        &self,
        catalog: &mut Catalog,
        slots: PairSlots,
        input: &PairInput,
        provider: &P,
        datetime: DateTime<Utc>,
    ) -> Result<ItemPair, CatalogError> {
        let img_id = self.item_id(&input.image_ref);
        let label_id = self.item_id(&input.label_ref);

        catalog.check_vacant(slots.image_parent, &img_id)?;
        catalog.check_vacant(slots.label_parent, &label_id)?;
        if slots.image_parent == slots.label_parent && img_id == label_id {
            return Err(CatalogError::DuplicateId {
                parent: catalog.display_path(slots.image_parent),
                id: label_id,
            });
        }

        let bbox = self.resolve_bbox(input, provider)?;

        let image = catalog.add_child(
            slots.image_parent,
            Node::item(img_id, bbox, Some(datetime)),
        )?;
        let image_href = href::join_uri(self.asset_base_uri.as_deref(), &input.image_ref);
        catalog.bind_asset(
            image,
            self.image_asset.key.clone(),
            self.image_asset.instantiate(image_href),
        )?;

        let mut label_node =
            Node::item(label_id, bbox, Some(datetime)).with_extension(LABEL_EXTENSION);
        if let Some(item) = label_node.as_item_mut() {
            self.label.apply(&mut item.properties);
        }
        let label = catalog.add_child(slots.label_parent, label_node)?;
        let label_href = href::join_uri(self.asset_base_uri.as_deref(), &input.label_ref);
        catalog.bind_asset(
            label,
            self.label_asset.key.clone(),
            self.label_asset.instantiate(label_href),
        )?;

        catalog.bind_link(
            label,
            Relation::Source,
            LinkTarget::Node(image),
            Some(MediaType::Json),
        )?;
        if self.reciprocal_links {
            catalog.bind_link(
                image,
                Relation::DerivedFrom,
                LinkTarget::Node(label),
                Some(MediaType::Json),
            )?;
            catalog.bind_link(
                label,
                Relation::DerivedFrom,
                LinkTarget::Node(image),
                Some(MediaType::Json),
            )?;
        }

        debug!(
            image = %catalog.node(image).id,
            label = %catalog.node(label).id,
            %bbox,
            "created item pair"
        );
        Ok(ItemPair { image, label })
    }

    fn resolve_bbox<P: BBoxProvider + ?Sized>(
        &self,
        input: &PairInput,
        provider: &P,
    ) -> Result<BBox, CatalogError> {
        let bbox = match input.bbox {
            Some(bbox) => bbox,
            None => provider
                .bbox(&input.image_ref)
                .map_err(|source| CatalogError::DataUnavailable {
                    image_ref: input.image_ref.clone(),
                    source,
                })?,
        };

        if !bbox.is_finite() {
            return Err(CatalogError::DataUnavailable {
                image_ref: input.image_ref.clone(),
                source: BBoxError::NotFinite {
                    image_ref: input.image_ref.clone(),
                },
            });
        }
        Ok(bbox)
    }
}
