//! Catalog construction.
//!
//! A [`CatalogBuilder`] owns one catalog tree while it is being populated:
//!
//! ```text
//! catalog.json
//! ├── image/collection.json
//! │   ├── train/catalog.json   (when splits are enabled)
//! │   └── test/catalog.json
//! └── label/collection.json
//!     ├── train/catalog.json
//!     └── test/catalog.json
//! ```
//!
//! Pairs are added in any order and any train/test interleaving. Once all
//! pairs are in, [`CatalogBuilder::finalize`] computes the image and label
//! collection extents from every item beneath them.

mod report;

pub use report::{
    BuildIssue, BuildIssueCode, BuildReport, BuildSeverity, ProcessedPair, SkippedPair,
};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::factory::{BBoxProvider, ItemPair, PairFactory, PairInput, PairSlots};
use crate::model::{aggregate, Extent, LabelSemantics, Node, NodeId, Split, LABEL_EXTENSION};

/// Identity of one of the two top-level collections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionOptions {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
}

impl CollectionOptions {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            title: None,
        }
    }
}

/// Shape of the catalog a builder creates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogOptions {
    pub id: String,
    pub description: String,
    pub title: Option<String>,
    /// Location of the root catalog document.
    pub href: String,
    /// Create train/test sub-catalogs under each collection.
    pub with_splits: bool,
    pub image_collection: CollectionOptions,
    pub label_collection: CollectionOptions,
}

impl CatalogOptions {
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
            with_splits: true,
            image_collection: CollectionOptions::new("image", "Image Chip Collection"),
            label_collection: CollectionOptions::new("label", "Labels Collection"),
        }
    }

    pub fn without_splits(mut self) -> Self {
        self.with_splits = false;
        self
    }
}

/// Builder lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting pairs; extents are placeholders.
    Populating,
    /// Extents reflect every item.
    Finalized,
    /// Pairs were added after finalize; extents are out of date until the
    /// next [`CatalogBuilder::finalize`].
    Stale,
}

/// A pair added to the catalog, with its split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairRecord {
    pub items: ItemPair,
    pub split: Option<Split>,
}

/// Builds an image/label catalog pair by pair.
#[derive(Debug)]
pub struct CatalogBuilder<P> {
    catalog: Catalog,
    factory: PairFactory,
    provider: P,
    phase: Phase,
    anchor: DateTime<Utc>,
    image_collection: NodeId,
    label_collection: NodeId,
    split_slots: Option<[PairSlots; 2]>,
    pairs: Vec<PairRecord>,
    skipped: Vec<SkippedPair>,
    issues: Vec<BuildIssue>,
}

impl<P: BBoxProvider> CatalogBuilder<P> {
    /// Creates the root catalog, both collections and, if requested, the
    /// train/test sub-catalogs.
    pub fn new(
        options: CatalogOptions,
        factory: PairFactory,
        provider: P,
    ) -> Result<Self, CatalogError> {
        Self::with_anchor(options, factory, provider, Utc::now())
    }

    /// Like [`CatalogBuilder::new`], with an explicit "current time" for
    /// open-ended temporal extents.
    pub fn with_anchor(
        options: CatalogOptions,
        factory: PairFactory,
        provider: P,
        anchor: DateTime<Utc>,
    ) -> Result<Self, CatalogError> {
        let mut root = Node::catalog(&options.id, &options.description);
        root.title = options.title.clone();
        let mut catalog = Catalog::new(root, &options.href)?;
        let root = catalog.root();

        let image_collection = catalog.add_child(
            root,
            collection_node(&options.image_collection, anchor, None),
        )?;
        let label_collection = catalog.add_child(
            root,
            collection_node(&options.label_collection, anchor, Some(&factory.label)),
        )?;

        let split_slots = if options.with_splits {
            let mut slots = Vec::with_capacity(2);
            for split in Split::ALL {
                let image_parent = catalog.add_child(
                    image_collection,
                    Node::catalog(split.as_str(), split.description()),
                )?;
                let label_parent = catalog.add_child(
                    label_collection,
                    Node::catalog(split.as_str(), split.description()),
                )?;
                slots.push(PairSlots {
                    image_parent,
                    label_parent,
                });
            }
            Some([slots[0], slots[1]])
        } else {
            None
        };

        info!(
            catalog = %options.id,
            href = %options.href,
            splits = options.with_splits,
            "created catalog"
        );

        Ok(Self {
            catalog,
            factory,
            provider,
            phase: Phase::Populating,
            anchor,
            image_collection,
            label_collection,
            split_slots,
            pairs: Vec::new(),
            skipped: Vec::new(),
            issues: Vec::new(),
        })
    }

    /// Adds a pair to the training split.
    pub fn add_train_pair(
        &mut self,
        image_ref: &str,
        label_ref: &str,
    ) -> Result<ItemPair, CatalogError> {
        self.add(&PairInput::new(image_ref, label_ref).with_split(Split::Train))
    }

    /// Adds a pair to the testing split.
    pub fn add_test_pair(
        &mut self,
        image_ref: &str,
        label_ref: &str,
    ) -> Result<ItemPair, CatalogError> {
        self.add(&PairInput::new(image_ref, label_ref).with_split(Split::Test))
    }

    /// Adds a pair directly under the image and label collections.
    pub fn add_pair(&mut self, image_ref: &str, label_ref: &str) -> Result<ItemPair, CatalogError> {
        self.add(&PairInput::new(image_ref, label_ref))
    }

    /// Adds one pair, filed according to `input.split`.
    ///
    /// # Errors
    /// Propagates [`PairFactory::make_pair`] errors; the catalog is
    /// unchanged when an error is returned. A pair refused with
    /// [`CatalogError::DataUnavailable`] is also recorded in
    /// [`CatalogBuilder::skipped`].
    pub fn add(&mut self, input: &PairInput) -> Result<ItemPair, CatalogError> {
        let slots = self.slots_for(input.split);
        let made = self.factory.make_pair(
            &mut self.catalog,
            slots,
            input,
            &self.provider,
            Utc::now(),
        );
        let items = match made {
            Ok(items) => items,
            Err(err @ CatalogError::DataUnavailable { .. }) => {
                warn!(image = %input.image_ref, error = %err, "skipping pair");
                self.skipped.push(SkippedPair {
                    image_ref: input.image_ref.clone(),
                    label_ref: input.label_ref.clone(),
                    split: input.split,
                    code: BuildIssueCode::DataUnavailable,
                    reason: err.to_string(),
                });
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.pairs.push(PairRecord {
            items,
            split: input.split,
        });

        if self.phase == Phase::Finalized {
            let message = format!(
                "pair '{}' added after finalize; extents are stale until finalize is called again",
                input.image_ref
            );
            warn!("{}", message);
            self.issues
                .push(BuildIssue::warning(BuildIssueCode::InvalidState, message));
            self.phase = Phase::Stale;
        }

        Ok(items)
    }

    /// Adds every pair, collecting per-pair failures.
    ///
    /// Pairs whose image bounds are unavailable are skipped and reported.
    /// Structural errors (duplicate or invalid ids) abort the batch, since
    /// they would corrupt the tree's locations.
    pub fn add_pairs<I>(&mut self, pairs: I) -> Result<BuildReport, CatalogError>
    where
        I: IntoIterator<Item = PairInput>,
    {
        let mut report = BuildReport::new(&self.catalog.node(self.catalog.root()).id);
        let issues_before = self.issues.len();
        let mut split_ignored = 0usize;

        for input in pairs {
            if input.split.is_some() && self.split_slots.is_none() {
                split_ignored += 1;
            }

            match self.add(&input) {
                Ok(items) => report.processed.push(ProcessedPair {
                    image_id: self.catalog.node(items.image).id.clone(),
                    label_id: self.catalog.node(items.label).id.clone(),
                    split: input.split,
                }),
                Err(CatalogError::DataUnavailable { .. }) => {
                    report.skipped.extend(self.skipped.last().cloned());
                }
                Err(err) => return Err(err),
            }
        }

        if split_ignored > 0 {
            report.add(BuildIssue::info(
                BuildIssueCode::SplitIgnored,
                format!(
                    "{} pair(s) requested a split but the catalog has no split sub-catalogs",
                    split_ignored
                ),
            ));
        }
        report.issues.extend(self.issues[issues_before..].iter().cloned());

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "added pairs"
        );
        Ok(report)
    }

    /// Recomputes the image and label collection extents from every item
    /// beneath them.
    ///
    /// Idempotent: with no intervening additions, repeated calls produce
    /// identical extents. Returns the warnings raised by this call.
    pub fn finalize(&mut self) -> Vec<BuildIssue> {
        let mut raised = Vec::new();

        for collection in [self.image_collection, self.label_collection] {
            let extent = self.compute_extent(collection);
            debug!(
                collection = %self.catalog.node(collection).id,
                bbox = ?extent.spatial.bbox,
                "finalized extent"
            );
            self.catalog.set_extent(collection, extent);
        }

        if self.pairs.is_empty() {
            let message = "finalized a catalog with no items; extents are unbounded".to_string();
            warn!("{}", message);
            raised.push(BuildIssue::warning(BuildIssueCode::InvalidState, message));
        }

        info!(pairs = self.pairs.len(), "catalog finalized");
        self.phase = Phase::Finalized;
        self.issues.extend(raised.iter().cloned());
        raised
    }

    fn compute_extent(&self, collection: NodeId) -> Extent {
        let items = self.catalog.items_under(collection);
        aggregate(
            items.iter().filter_map(|id| self.catalog.node(*id).as_item()),
            self.anchor,
        )
    }

    fn slots_for(&self, split: Option<Split>) -> PairSlots {
        match (split, &self.split_slots) {
            (Some(split), Some(slots)) => slots[split_index(split)],
            _ => PairSlots {
                image_parent: self.image_collection,
                label_parent: self.label_collection,
            },
        }
    }
}

impl<P> CatalogBuilder<P> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The tree as built so far.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn image_collection(&self) -> NodeId {
        self.image_collection
    }

    pub fn label_collection(&self) -> NodeId {
        self.label_collection
    }

    /// The image or label sub-catalog for `split`, if splits are enabled.
    pub fn split_catalogs(&self, split: Split) -> Option<PairSlots> {
        self.split_slots.map(|slots| slots[split_index(split)])
    }

    /// Every pair added so far, in order.
    pub fn pairs(&self) -> &[PairRecord] {
        &self.pairs
    }

    /// Pairs refused for unavailable image bounds, over the builder's
    /// lifetime.
    pub fn skipped(&self) -> &[SkippedPair] {
        &self.skipped
    }

    /// Every warning raised over the builder's lifetime.
    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    /// Report covering every pair added or skipped so far, whether through
    /// [`CatalogBuilder::add_pairs`] or single-pair calls.
    pub fn report(&self) -> BuildReport {
        let mut report = BuildReport::new(&self.catalog.node(self.catalog.root()).id);
        report.processed = self
            .pairs
            .iter()
            .map(|record| ProcessedPair {
                image_id: self.catalog.node(record.items.image).id.clone(),
                label_id: self.catalog.node(record.items.label).id.clone(),
                split: record.split,
            })
            .collect();
        report.skipped = self.skipped.clone();
        report.issues = self.issues.clone();
        report
    }

    /// The anchor used for open-ended temporal extents.
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Hands over the finished tree.
    pub fn into_catalog(self) -> Catalog {
        if self.phase != Phase::Finalized {
            warn!(
                phase = ?self.phase,
                "catalog handed over without a final finalize; extents may be stale"
            );
        }
        self.catalog
    }
}

fn split_index(split: Split) -> usize {
    match split {
        Split::Train => 0,
        Split::Test => 1,
    }
}

fn collection_node(
    options: &CollectionOptions,
    anchor: DateTime<Utc>,
    label: Option<&LabelSemantics>,
) -> Node {
    let mut node = Node::collection(
        &options.id,
        &options.description,
        Extent::placeholder(anchor),
    );
    node.title = options.title.clone();
    if let Some(label) = label {
        if let Some(collection) = node.as_collection_mut() {
            label.apply(&mut collection.properties);
        }
        node.add_extension(LABEL_EXTENSION);
    }
    node
}
