//! Deriving an ML-oriented catalog from a built image/label catalog.
//!
//! The source tree keeps images and labels in parallel collections. Training
//! pipelines want one item per sample instead, so [`MlCatalogBuilder`]
//! produces a second tree:
//!
//! ```text
//! catalog.json
//! ├── train/collection.json
//! │   └── <image id>/<image id>.json   (rgb + labels assets)
//! └── test/collection.json
//! ```
//!
//! Each combined item carries `derived_from` links to both source items.

mod report;

pub use report::{AddedSample, SkippedSample, SplitIssueCode, SplitReport};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::builder::{BuildIssue, BuildIssueCode, Phase};
use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::model::{
    aggregate, Extent, LabelSemantics, LinkTarget, MediaType, Node, NodeId, Relation, Split,
    LABEL_EXTENSION,
};

/// Asset key of the image raster on combined items.
pub const IMAGE_ASSET_KEY: &str = "rgb";
/// Asset key of the label vector on combined items.
pub const LABEL_ASSET_KEY: &str = "labels";

/// Descriptor of the derived catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct MlCatalogOptions {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
    /// Location of the root catalog document.
    pub href: String,
    /// Semantics written onto both split collections.
    pub label: LabelSemantics,
    pub image_asset_key: String,
    pub label_asset_key: String,
}

impl MlCatalogOptions {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            title: None,
            href: href.into(),
            label: LabelSemantics::default(),
            image_asset_key: IMAGE_ASSET_KEY.to_string(),
            label_asset_key: LABEL_ASSET_KEY.to_string(),
        }
    }

    pub fn with_label(mut self, label: LabelSemantics) -> Self {
        self.label = label;
        self
    }
}

/// An image/label pair discovered in a source catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePair {
    pub image: NodeId,
    pub label: NodeId,
    /// `None` when neither item sits under a `train` or `test` catalog.
    pub split: Option<Split>,
}

/// Finds every label item with a `source` link to an image item in the
/// same tree, in pre-order.
///
/// The split is taken from the nearest `train`/`test` ancestor of the image
/// item, falling back to the label item's.
pub fn source_pairs(catalog: &Catalog) -> Vec<SourcePair> {
    let mut pairs = Vec::new();
    for (_, label) in catalog.walk() {
        if catalog.node(label).as_item().is_none() {
            continue;
        }
        for link in catalog.links_with(label, &Relation::Source) {
            let LinkTarget::Node(image) = &link.target else {
                continue;
            };
            let image = *image;
            if catalog.node(image).as_item().is_none() {
                continue;
            }
            pairs.push(SourcePair {
                image,
                label,
                split: split_of(catalog, image).or_else(|| split_of(catalog, label)),
            });
        }
    }
    pairs
}

fn split_of(catalog: &Catalog, id: NodeId) -> Option<Split> {
    catalog.ancestors(id).into_iter().find_map(|ancestor| {
        let name = catalog.node(ancestor).id.as_str();
        Split::ALL.into_iter().find(|split| split.as_str() == name)
    })
}

/// Builds an ML catalog with one combined item per sample.
#[derive(Debug)]
pub struct MlCatalogBuilder {
    catalog: Catalog,
    options: MlCatalogOptions,
    train: NodeId,
    test: NodeId,
    anchor: DateTime<Utc>,
    phase: Phase,
    issues: Vec<BuildIssue>,
}

impl MlCatalogBuilder {
    /// Creates the root catalog with its `train` and `test` collections.
    pub fn new(options: MlCatalogOptions) -> Result<Self, CatalogError> {
        Self::with_anchor(options, Utc::now())
    }

    /// Like [`MlCatalogBuilder::new`] with an explicit "current time", used
    /// for open-ended extents and for source items without a timestamp.
    pub fn with_anchor(
        options: MlCatalogOptions,
        anchor: DateTime<Utc>,
    ) -> Result<Self, CatalogError> {
        let mut root = Node::catalog(&options.id, &options.description);
        root.title = options.title.clone();
        let mut catalog = Catalog::new(root, &options.href)?;
        let root = catalog.root();

        let mut collections = Vec::with_capacity(2);
        for split in Split::ALL {
            let mut node = Node::collection(
                split.as_str(),
                split.description(),
                Extent::placeholder(anchor),
            )
            .with_extension(LABEL_EXTENSION);
            if let Some(collection) = node.as_collection_mut() {
                options.label.apply(&mut collection.properties);
            }
            collections.push(catalog.add_child(root, node)?);
        }

        info!(catalog = %options.id, href = %options.href, "created ML catalog");

        Ok(Self {
            catalog,
            train: collections[0],
            test: collections[1],
            options,
            anchor,
            phase: Phase::Populating,
            issues: Vec::new(),
        })
    }

    /// Adds a combined item to the `train` collection.
    pub fn add_train_pair(
        &mut self,
        source: &Catalog,
        image: NodeId,
        label: NodeId,
    ) -> Result<NodeId, CatalogError> {
        self.add_pair(source, image, label, Split::Train)
    }

    /// Adds a combined item to the `test` collection.
    pub fn add_test_pair(
        &mut self,
        source: &Catalog,
        image: NodeId,
        label: NodeId,
    ) -> Result<NodeId, CatalogError> {
        self.add_pair(source, image, label, Split::Test)
    }

    /// Re-derives one sample from `image` and `label` in `source`.
    ///
    /// The combined item takes the image item's id, geometry, bbox and
    /// timestamp, copies the image and label assets, and links back to both
    /// source items with `derived_from`.
    ///
    /// # Errors
    /// - [`CatalogError::NotAnItem`] if either node is a container
    /// - [`CatalogError::MissingAsset`] if a required asset is absent
    /// - [`CatalogError::DuplicateId`] if the split already holds the id
    pub fn add_pair(
        &mut self,
        source: &Catalog,
        image: NodeId,
        label: NodeId,
        split: Split,
    ) -> Result<NodeId, CatalogError> {
        let image_node = source.node(image);
        let label_node = source.node(label);
        let image_item = source.item(image)?;
        let label_item = source.item(label)?;

        let image_asset = image_item
            .assets
            .get(&self.options.image_asset_key)
            .ok_or_else(|| CatalogError::MissingAsset {
                item_id: image_node.id.clone(),
                key: self.options.image_asset_key.clone(),
            })?;
        let label_asset = label_item
            .assets
            .get(&self.options.label_asset_key)
            .ok_or_else(|| CatalogError::MissingAsset {
                item_id: label_node.id.clone(),
                key: self.options.label_asset_key.clone(),
            })?;

        let parent = self.collection(split);
        self.catalog.check_vacant(parent, &image_node.id)?;

        let mut node = Node::item(
            &image_node.id,
            image_item.bbox,
            Some(image_item.datetime.unwrap_or(self.anchor)),
        );
        if let Some(item) = node.as_item_mut() {
            item.geometry = image_item.geometry.clone();
        }

        let id = self.catalog.add_child(parent, node)?;
        self.catalog
            .bind_asset(id, self.options.image_asset_key.clone(), image_asset.clone())?;
        self.catalog
            .bind_asset(id, self.options.label_asset_key.clone(), label_asset.clone())?;
        for source_node in [image_node, label_node] {
            self.catalog.bind_link(
                id,
                Relation::DerivedFrom,
                LinkTarget::Href(source_node.href.clone()),
                Some(MediaType::Json),
            )?;
        }

        if self.phase == Phase::Finalized {
            let message = format!(
                "sample '{}' added after finalize; extents are stale until finalize is called again",
                image_node.id
            );
            warn!("{}", message);
            self.issues
                .push(BuildIssue::warning(BuildIssueCode::InvalidState, message));
            self.phase = Phase::Stale;
        }

        debug!(id = %image_node.id, %split, "added combined item");
        Ok(id)
    }

    /// Carries every pair of `source` over to this catalog.
    ///
    /// Pairs with a missing asset or without a split are skipped and
    /// reported. Any other error aborts.
    pub fn extend_from(&mut self, source: &Catalog) -> Result<SplitReport, CatalogError> {
        let mut report = SplitReport::new(&self.options.id);

        for pair in source_pairs(source) {
            let image_id = source.node(pair.image).id.clone();
            let label_id = source.node(pair.label).id.clone();

            let Some(split) = pair.split else {
                warn!(image = %image_id, "source pair has no split, skipping");
                report.skipped.push(SkippedSample {
                    item_id: image_id.clone(),
                    image_id,
                    label_id,
                    code: SplitIssueCode::UnassignedSplit,
                    reason: "pair is not filed under a train or test catalog".to_string(),
                });
                continue;
            };

            match self.add_pair(source, pair.image, pair.label, split) {
                Ok(_) => report.added.push(AddedSample {
                    id: image_id,
                    split,
                }),
                Err(CatalogError::MissingAsset { item_id, key }) => {
                    warn!(item = %item_id, key = %key, "skipping sample with missing asset");
                    report.skipped.push(SkippedSample {
                        reason: format!("item '{}' is missing required asset '{}'", item_id, key),
                        item_id,
                        image_id,
                        label_id,
                        code: SplitIssueCode::MissingAsset,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            "derived ML catalog"
        );
        Ok(report)
    }

    /// Computes the extent of both split collections.
    pub fn finalize(&mut self) -> Vec<BuildIssue> {
        let mut raised = Vec::new();
        let mut total = 0;

        for collection in [self.train, self.test] {
            let items = self.catalog.items_under(collection);
            total += items.len();
            let extent = aggregate(
                items
                    .iter()
                    .filter_map(|id| self.catalog.node(*id).as_item()),
                self.anchor,
            );
            self.catalog.set_extent(collection, extent);
        }

        if total == 0 {
            let message = "finalized an ML catalog with no samples; extents are unbounded";
            warn!("{}", message);
            raised.push(BuildIssue::warning(BuildIssueCode::InvalidState, message));
        }

        self.phase = Phase::Finalized;
        self.issues.extend(raised.iter().cloned());
        raised
    }

    /// The collection samples of `split` are filed under.
    pub fn collection(&self, split: Split) -> NodeId {
        match split {
            Split::Train => self.train,
            Split::Test => self.test,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        if self.phase != Phase::Finalized {
            warn!(
                phase = ?self.phase,
                "ML catalog handed over without a final finalize; extents may be stale"
            );
        }
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CatalogBuilder, CatalogOptions};
    use crate::error::BBoxError;
    use crate::factory::PairFactory;
    use crate::model::{BBox, LabelClasses, LabelType};
    use chrono::TimeZone;

    type Provider = fn(&str) -> Result<BBox, BBoxError>;

    fn provider(image_ref: &str) -> Result<BBox, BBoxError> {
        Ok(match image_ref {
            "b.tif" => BBox::from_xyxy(2.0, 2.0, 3.0, 3.0),
            _ => BBox::from_xyxy(0.0, 0.0, 1.0, 1.0),
        })
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn source() -> Catalog {
        let mut b = CatalogBuilder::with_anchor(
            CatalogOptions::new("tiny", "Tiny", "/out/src/catalog.json"),
            PairFactory::default(),
            provider as Provider,
            anchor(),
        )
        .unwrap();
        b.add_train_pair("a.tif", "a_labels.geojson").unwrap();
        b.add_test_pair("b.tif", "b_labels.geojson").unwrap();
        b.finalize();
        b.into_catalog()
    }

    fn ml() -> MlCatalogBuilder {
        let label = LabelSemantics {
            label_type: LabelType::Vector,
            tasks: vec!["segmentation".into()],
            classes: vec![LabelClasses::new(["building", "background"])],
            description: None,
        };
        MlCatalogBuilder::with_anchor(
            MlCatalogOptions::new("ml", "ML catalog", "/out/ml/catalog.json").with_label(label),
            anchor(),
        )
        .unwrap()
    }

    #[test]
    fn discovers_pairs_with_splits() {
        let source = source();
        let pairs = source_pairs(&source);
        assert_eq!(pairs.len(), 2);
        assert_eq!(source.node(pairs[0].image).id, "a");
        assert_eq!(source.node(pairs[0].label).id, "a_labels");
        assert_eq!(pairs[0].split, Some(Split::Train));
        assert_eq!(pairs[1].split, Some(Split::Test));
    }

    #[test]
    fn combined_item_carries_both_assets_and_provenance() {
        let source = source();
        let mut ml = ml();
        let report = ml.extend_from(&source).unwrap();
        assert!(report.is_complete());

        let catalog = ml.catalog();
        let train = ml.collection(Split::Train);
        let id = catalog.find_child(train, "a").unwrap();
        assert_eq!(catalog.node(id).href, "/out/ml/train/a/a.json");

        let item = catalog.item(id).unwrap();
        assert!(item.assets.contains_key("rgb"));
        assert!(item.assets.contains_key("labels"));
        assert_eq!(item.bbox, BBox::from_xyxy(0.0, 0.0, 1.0, 1.0));

        let hrefs: Vec<_> = catalog
            .links_with(id, &Relation::DerivedFrom)
            .map(|link| catalog.link_href(link).to_string())
            .collect();
        assert_eq!(
            hrefs,
            vec![
                "/out/src/image/train/a/a.json".to_string(),
                "/out/src/label/train/a_labels/a_labels.json".to_string(),
            ]
        );
        assert!(catalog.find_child(ml.collection(Split::Test), "a").is_none());
    }

    #[test]
    fn collections_carry_label_properties() {
        let ml = ml();
        for split in Split::ALL {
            let node = ml.catalog().node(ml.collection(split));
            let properties = &node.as_collection().unwrap().properties;
            let semantics = LabelSemantics::from_properties(properties).unwrap();
            assert_eq!(semantics.class_names(), vec!["building", "background"]);
        }
    }

    #[test]
    fn missing_labels_asset_is_skipped_and_reported() {
        let source = source();
        let pairs = source_pairs(&source);

        // Rebuild the source with the first label item stripped of its asset.
        let mut broken = source.clone();
        broken
            .item_mut(pairs[0].label)
            .unwrap()
            .assets
            .remove("labels");

        let mut ml = ml();
        let report = ml.extend_from(&broken).unwrap();
        assert_eq!(report.skipped_ids(), vec!["a_labels"]);
        assert_eq!(report.skipped[0].code, SplitIssueCode::MissingAsset);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].id, "b");
    }

    #[test]
    fn missing_asset_error_names_item_and_key() {
        let mut source = source();
        let pairs = source_pairs(&source);
        source.item_mut(pairs[0].image).unwrap().assets.remove("rgb");

        let err = ml()
            .add_train_pair(&source, pairs[0].image, pairs[0].label)
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingAsset { ref item_id, ref key } if item_id == "a" && key == "rgb"
        ));
    }

    #[test]
    fn unsplit_pairs_are_skipped() {
        let mut b = CatalogBuilder::with_anchor(
            CatalogOptions::new("tiny", "Tiny", "/out/src/catalog.json").without_splits(),
            PairFactory::default(),
            provider as Provider,
            anchor(),
        )
        .unwrap();
        b.add_pair("a.tif", "a_labels.geojson").unwrap();
        let source = b.into_catalog();

        let report = ml().extend_from(&source).unwrap();
        assert!(report.added.is_empty());
        assert_eq!(report.skipped[0].code, SplitIssueCode::UnassignedSplit);
    }

    #[test]
    fn duplicate_sample_aborts() {
        let source = source();
        let mut ml = ml();
        ml.extend_from(&source).unwrap();
        let err = ml.extend_from(&source).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn finalize_covers_split_items() {
        let source = source();
        let mut ml = ml();
        ml.extend_from(&source).unwrap();
        assert!(ml.finalize().is_empty());

        let test = ml.catalog().node(ml.collection(Split::Test));
        assert_eq!(
            test.as_collection().unwrap().extent.spatial.bbox,
            Some(BBox::from_xyxy(2.0, 2.0, 3.0, 3.0))
        );
        assert_eq!(ml.phase(), Phase::Finalized);
    }
}
